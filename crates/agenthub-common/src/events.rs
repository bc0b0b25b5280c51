//! Hub event types, shared between the API, the dispatch worker and the gateway.
//!
//! Producers emit a [`HubEvent`] when something operators should see happens
//! (a new message arrived, an agent replied). The gateway forwards each event to
//! every WebSocket connection whose subscriptions match.

use serde::{Deserialize, Serialize};

use crate::models::{Chat, Message};

pub const NEW_MESSAGE: &str = "new_message";

/// Characters of message content included in the `preview` field.
pub const PREVIEW_LEN: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubEvent {
    /// Event type (e.g. "new_message")
    pub event_type: String,
    /// Wire payload sent to clients as-is
    pub data: serde_json::Value,
    /// Chat the event belongs to (subscription filter)
    pub chat_id: Option<String>,
    /// Channel the event belongs to (subscription filter)
    pub channel_id: Option<String>,
}

impl HubEvent {
    /// Build the `new_message` notification for a freshly stored message.
    pub fn new_message(chat: &Chat, message: &Message) -> Self {
        let data = serde_json::json!({
            "type": NEW_MESSAGE,
            "chat_id": chat.id,
            "channel_id": chat.channel_id,
            "message_id": message.id,
            "sender_type": message.sender_type,
            "timestamp": message.timestamp,
            "message_type": message.message_type(),
            "content": message.content,
            "preview": preview(&message.content),
            "external_id": message.external_id,
            "chat_name": chat.name,
            "chat_external_id": chat.external_id,
        });

        Self {
            event_type: NEW_MESSAGE.into(),
            data,
            chat_id: Some(chat.id.clone()),
            channel_id: Some(chat.channel_id.clone()),
        }
    }

    /// Whether a connection subscribed to `subscriptions` should receive this event.
    /// An empty subscription list receives everything.
    pub fn matches(&self, subscriptions: &[String]) -> bool {
        subscriptions.is_empty()
            || subscriptions.iter().any(|s| {
                self.chat_id.as_deref() == Some(s.as_str())
                    || self.channel_id.as_deref() == Some(s.as_str())
            })
    }
}

/// First [`PREVIEW_LEN`] characters, with `...` appended when truncated.
pub fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_LEN) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeliveryStatus, SenderType};
    use chrono::Utc;

    fn chat() -> Chat {
        Chat {
            id: "chat_1".into(),
            name: "+15550001111".into(),
            external_id: "15550001111".into(),
            channel_id: "channel_1".into(),
            contact_id: None,
            assigned_user_id: None,
            last_message_ts: Utc::now(),
            last_sender_type: Some(SenderType::Contact),
            last_message: None,
            meta_data: serde_json::json!({}),
            extra_data: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }

    fn message(content: &str) -> Message {
        Message {
            id: "message_1".into(),
            external_id: Some("wamid.1".into()),
            chat_id: "chat_1".into(),
            content: content.into(),
            sender_type: SenderType::Contact,
            timestamp: Utc::now(),
            meta_data: serde_json::json!({"message_type": "image"}),
            readed: false,
            delivery_status: DeliveryStatus::Sent,
        }
    }

    #[test]
    fn test_preview_truncates_long_content() {
        let long = "a".repeat(150);
        let p = preview(&long);
        assert_eq!(p.len(), PREVIEW_LEN + 3);
        assert!(p.ends_with("..."));
        assert_eq!(preview("short"), "short");
        assert_eq!(preview(&"b".repeat(100)), "b".repeat(100));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let emoji = "é".repeat(120);
        let p = preview(&emoji);
        assert_eq!(p.chars().count(), PREVIEW_LEN + 3);
    }

    #[test]
    fn test_new_message_payload() {
        let event = HubEvent::new_message(&chat(), &message("hello"));
        assert_eq!(event.event_type, NEW_MESSAGE);
        assert_eq!(event.data["type"], "new_message");
        assert_eq!(event.data["chat_id"], "chat_1");
        assert_eq!(event.data["channel_id"], "channel_1");
        assert_eq!(event.data["sender_type"], "CONTACT");
        assert_eq!(event.data["message_type"], "image");
        assert_eq!(event.data["preview"], "hello");
        assert_eq!(event.data["chat_external_id"], "15550001111");
    }

    #[test]
    fn test_subscription_matching() {
        let event = HubEvent::new_message(&chat(), &message("hi"));
        assert!(event.matches(&[]));
        assert!(event.matches(&["chat_1".into()]));
        assert!(event.matches(&["channel_1".into()]));
        assert!(!event.matches(&["chat_2".into(), "channel_9".into()]));
    }
}
