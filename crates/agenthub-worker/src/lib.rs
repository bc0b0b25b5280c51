//! # agenthub-worker
//!
//! Work that happens after a request has been answered:
//! - **delivery**: store a reply, push it to the messaging platform, notify the gateway
//! - **dispatch**: hand conversations to AI agents once the chat has gone quiet
//! - **webhook**: the retrying HTTP client agents are called with

pub mod delivery;
pub mod dispatch;
pub mod webhook;

pub use delivery::Delivery;
pub use dispatch::{DispatchContext, DispatchOutcome, Dispatcher};
pub use webhook::WebhookClient;
