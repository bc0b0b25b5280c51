//! Free-text notes attached to chats and tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Unset when an agent wrote the note.
    pub created_by_user_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNoteRequest {
    #[validate(length(min = 1, max = 10_000, message = "Content must be 1-10000 characters"))]
    pub content: String,
}
