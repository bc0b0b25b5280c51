//! Kanban boards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::task::Task;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Board {
    pub id: String,
    pub name: String,
    /// Ordered column names.
    pub columns: Vec<String>,
    #[serde(skip_serializing, default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct BoardDetail {
    #[serde(flatten)]
    pub board: Board,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBoardRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBoardRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub columns: Option<Vec<String>>,
}

fn default_columns() -> Vec<String> {
    vec!["To Do".into(), "In Progress".into(), "Done".into()]
}
