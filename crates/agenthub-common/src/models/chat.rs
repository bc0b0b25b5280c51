//! Chat model: one conversation between a contact and the hub on a channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::SenderType;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Chat {
    pub id: String,
    pub name: String,
    /// Platform-side conversation ID (phone number, Telegram chat id, ...).
    pub external_id: String,
    pub channel_id: String,
    pub contact_id: Option<String>,
    pub assigned_user_id: Option<String>,
    pub last_message_ts: DateTime<Utc>,
    pub last_sender_type: Option<SenderType>,
    pub last_message: Option<String>,
    pub meta_data: serde_json::Value,
    pub extra_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub assigned_user_id: Option<String>,
    /// `true`: only assigned chats, `false`: only unassigned chats.
    pub assigned: Option<bool>,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatList {
    pub chats: Vec<Chat>,
    pub total_count: i64,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct AssignChatRequest {
    /// `null` unassigns the chat.
    pub user_id: Option<String>,
}
