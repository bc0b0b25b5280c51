//! Message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SenderType {
    /// The end customer on the messaging platform
    Contact,
    /// A human operator
    User,
    Agent,
}

impl SenderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "CONTACT",
            Self::User => "USER",
            Self::Agent => "AGENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl DeliveryStatus {
    /// Map a platform status string (`sent`, `delivered`, `read`, `failed`).
    pub fn from_platform(status: &str) -> Option<Self> {
        match status.to_ascii_lowercase().as_str() {
            "sent" => Some(Self::Sent),
            "delivered" => Some(Self::Delivered),
            "read" => Some(Self::Read),
            "failed" | "undelivered" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: String,
    /// Platform-side message ID, once known.
    pub external_id: Option<String>,
    pub chat_id: String,
    pub content: String,
    pub sender_type: SenderType,
    pub timestamp: DateTime<Utc>,
    pub meta_data: serde_json::Value,
    pub readed: bool,
    pub delivery_status: DeliveryStatus,
}

impl Message {
    /// `meta_data.message_type`, defaulting to `text`.
    pub fn message_type(&self) -> &str {
        self.meta_data
            .get("message_type")
            .and_then(|v| v.as_str())
            .unwrap_or("text")
    }
}

/// Fields for inserting a message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub chat_id: String,
    pub content: String,
    pub sender_type: SenderType,
    pub external_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub meta_data: serde_json::Value,
    pub delivery_status: DeliveryStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 4096, message = "Content must be 1-4096 characters"))]
    pub content: String,
    #[serde(default)]
    pub meta_data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageList {
    pub messages: Vec<Message>,
    pub total_count: i64,
    pub has_more: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_status_mapping() {
        assert_eq!(DeliveryStatus::from_platform("delivered"), Some(DeliveryStatus::Delivered));
        assert_eq!(DeliveryStatus::from_platform("READ"), Some(DeliveryStatus::Read));
        assert_eq!(DeliveryStatus::from_platform("undelivered"), Some(DeliveryStatus::Failed));
        assert_eq!(DeliveryStatus::from_platform("queued"), None);
    }

    #[test]
    fn test_empty_content_rejected() {
        let req = SendMessageRequest {
            content: String::new(),
            meta_data: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_message_type_defaults_to_text() {
        let msg = Message {
            id: "message_abc".into(),
            external_id: None,
            chat_id: "chat_abc".into(),
            content: "hi".into(),
            sender_type: SenderType::Contact,
            timestamp: Utc::now(),
            meta_data: serde_json::json!({}),
            readed: false,
            delivery_status: DeliveryStatus::Sent,
        };
        assert_eq!(msg.message_type(), "text");
    }
}
