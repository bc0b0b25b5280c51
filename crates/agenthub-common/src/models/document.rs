//! File references attached to chats and tasks. Files live elsewhere; only the URL is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: String,
    pub file_url: String,
    pub file_name: String,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by_user_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AttachDocumentRequest {
    #[validate(url(message = "Invalid file URL"))]
    pub file_url: String,
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    /// Guessed from `file_name` when omitted.
    pub mime_type: Option<String>,
}
