//! Tasks on a board, optionally tied to a chat.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::document::Document;
use super::note::Note;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: String,
    pub board_id: Option<String>,
    /// Board column the task currently sits in.
    #[sqlx(rename = "column_name")]
    pub column: String,
    pub chat_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    #[serde(skip_serializing, default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub notes: Vec<Note>,
    pub documents: Vec<Document>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub board_id: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub column: String,
    pub chat_id: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 10_000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    pub board_id: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub column: Option<String>,
    pub chat_id: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 10_000))]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskDeleteResponse {
    pub success: bool,
    pub message: String,
}
