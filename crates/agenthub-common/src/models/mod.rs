//! Core domain models shared across all Agent Hub services.
//!
//! These are the "truth" types: what the database stores and the API serializes.
//! Every entity uses a prefixed random ID (see [`crate::ids`]).

pub mod agent;
pub mod board;
pub mod channel;
pub mod chat;
pub mod chat_agent;
pub mod document;
pub mod menu;
pub mod message;
pub mod note;
pub mod task;
pub mod token;
pub mod user;

pub use agent::*;
pub use board::*;
pub use channel::*;
pub use chat::*;
pub use chat_agent::*;
pub use document::*;
pub use menu::*;
pub use message::*;
pub use note::*;
pub use task::*;
pub use token::*;
pub use user::*;

use serde::{Deserialize, Serialize};

/// Plain `{ "message": ... }` acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Query string for soft/hard delete endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub hard: bool,
}

/// `limit`/`offset` pagination shared by list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

pub const MAX_PAGE_SIZE: i64 = 100;

fn default_limit() -> i64 {
    50
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl Pagination {
    /// Clamp into `1..=MAX_PAGE_SIZE` and a non-negative offset.
    pub fn clamped(self) -> Self {
        Self {
            limit: self.limit.clamp(1, MAX_PAGE_SIZE),
            offset: self.offset.max(0),
        }
    }

    pub fn has_more(&self, total_count: i64) -> bool {
        self.offset + self.limit < total_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamps() {
        let p = Pagination { limit: 500, offset: -3 }.clamped();
        assert_eq!(p.limit, MAX_PAGE_SIZE);
        assert_eq!(p.offset, 0);
        let p = Pagination { limit: 0, offset: 10 }.clamped();
        assert_eq!(p.limit, 1);
    }

    #[test]
    fn test_has_more() {
        let p = Pagination { limit: 50, offset: 0 };
        assert!(p.has_more(51));
        assert!(!p.has_more(50));
        let p = Pagination { limit: 10, offset: 40 };
        assert!(!p.has_more(45));
    }
}
