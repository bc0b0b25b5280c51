//! Agent model: an external AI service reached through a webhook.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub webhook_url: Option<String>,
    pub is_active: bool,
    /// When false, a JSON `content` in the webhook response is posted back to the chat.
    pub is_fire_and_forget: bool,
    /// Quiet period after the last message before the agent is called.
    pub buffer_time_seconds: i32,
    /// Maximum number of messages sent to the agent per call.
    pub history_msg_count: i32,
    /// Only messages newer than this many minutes are sent.
    pub recent_msg_window_minutes: i32,
    /// Initial `active` flag of chat links created for new conversations.
    pub activate_for_new_conversation: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAgentRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(url(message = "Invalid webhook URL"))]
    pub webhook_url: Option<String>,

    #[serde(default)]
    pub is_fire_and_forget: bool,

    #[validate(range(min = 0, max = 3600))]
    #[serde(default = "default_buffer_time_seconds")]
    pub buffer_time_seconds: i32,

    #[validate(range(min = 1, max = 500))]
    #[serde(default = "default_history_msg_count")]
    pub history_msg_count: i32,

    #[validate(range(min = 1))]
    #[serde(default = "default_recent_msg_window_minutes")]
    pub recent_msg_window_minutes: i32,

    #[serde(default = "default_true")]
    pub activate_for_new_conversation: bool,

    /// Validated to exist; agents are not bound to a single channel.
    pub channel_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAgentRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(url(message = "Invalid webhook URL"))]
    pub webhook_url: Option<String>,
    pub is_active: Option<bool>,
    pub is_fire_and_forget: Option<bool>,
    #[validate(range(min = 0, max = 3600))]
    pub buffer_time_seconds: Option<i32>,
    #[validate(range(min = 1, max = 500))]
    pub history_msg_count: Option<i32>,
    #[validate(range(min = 1))]
    pub recent_msg_window_minutes: Option<i32>,
    pub activate_for_new_conversation: Option<bool>,
    pub channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AgentListQuery {
    #[serde(default = "default_true")]
    pub active: bool,
}

pub fn default_buffer_time_seconds() -> i32 {
    3
}

pub fn default_history_msg_count() -> i32 {
    40
}

pub fn default_recent_msg_window_minutes() -> i32 {
    1440
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults() {
        let req: CreateAgentRequest =
            serde_json::from_str(r#"{"name":"Support bot","webhook_url":"https://bot.example.com/hook"}"#)
                .unwrap();
        assert_eq!(req.buffer_time_seconds, 3);
        assert_eq!(req.history_msg_count, 40);
        assert_eq!(req.recent_msg_window_minutes, 1440);
        assert!(req.activate_for_new_conversation);
        assert!(!req.is_fire_and_forget);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_webhook_url() {
        let req: CreateAgentRequest =
            serde_json::from_str(r#"{"name":"x","webhook_url":"not a url"}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_list_query_defaults_to_active() {
        let q: AgentListQuery = serde_json::from_str("{}").unwrap();
        assert!(q.active);
    }
}
