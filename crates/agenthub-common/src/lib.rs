//! # agenthub-common
//!
//! Shared types, configuration, error handling, and utilities used across all Agent Hub crates.
//! This is the foundation layer: no I/O, just primitives and contracts.

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod models;
pub mod validation;
