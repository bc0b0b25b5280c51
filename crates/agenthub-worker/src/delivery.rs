//! Reply delivery: persist an outgoing message, push it to the platform, notify operators.
//!
//! Platform failures never bubble up to the caller. They are recorded on the
//! message (`delivery_status = FAILED` plus `platform_error*` metadata).

use agenthub_common::events::HubEvent;
use agenthub_common::ids;
use agenthub_common::models::{Chat, DeliveryStatus, Message, NewMessage, SenderType};
use agenthub_db::repository::{channels, chats, messages};
use agenthub_platforms::PlatformError;
use agenthub_platforms::outbound::{self, SendReceipt};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct Delivery {
    db: PgPool,
    http: reqwest::Client,
    events: broadcast::Sender<HubEvent>,
}

impl Delivery {
    pub fn new(db: PgPool, http: reqwest::Client, events: broadcast::Sender<HubEvent>) -> Self {
        Self { db, http, events }
    }

    /// Broadcast a `new_message` event. Having no listeners is fine.
    pub fn notify(&self, chat: &Chat, message: &Message) {
        let receivers = self.events.send(HubEvent::new_message(chat, message)).unwrap_or(0);
        tracing::debug!(chat_id = %chat.id, message_id = %message.id, receivers, "new_message broadcast");
    }

    /// Store a USER or AGENT message on `chat`, deliver it, and optionally notify.
    ///
    /// Returns the stored message with its delivery outcome applied.
    pub async fn post_reply(
        &self,
        chat: &Chat,
        sender_type: SenderType,
        content: &str,
        meta_data: serde_json::Value,
        notify: bool,
    ) -> Result<Message, sqlx::Error> {
        let now = Utc::now();
        let message = messages::create_message(
            &self.db,
            &ids::generate(ids::MESSAGE),
            &NewMessage {
                chat_id: chat.id.clone(),
                content: content.to_string(),
                sender_type,
                external_id: None,
                timestamp: now,
                meta_data: with_message_type(meta_data),
                delivery_status: DeliveryStatus::Pending,
            },
        )
        .await?;

        let chat = chats::touch_last_message(&self.db, &chat.id, now, sender_type, content).await?;
        let message = self.deliver(&chat, message).await?;

        if notify {
            self.notify(&chat, &message);
        }
        Ok(message)
    }

    /// Push an already stored message to the chat's platform and record the outcome.
    pub async fn deliver(&self, chat: &Chat, message: Message) -> Result<Message, sqlx::Error> {
        let result = match channels::find_by_id(&self.db, &chat.channel_id).await? {
            Some(channel) => {
                outbound::send_text(&self.http, &channel, &chat.external_id, &message.content).await
            }
            None => Err(PlatformError::InvalidConfig(format!(
                "channel {} no longer exists",
                chat.channel_id
            ))),
        };

        match &result {
            Ok(receipt) => tracing::info!(
                message_id = %message.id,
                chat_id = %chat.id,
                external_id = ?receipt.external_id,
                "Message delivered to platform"
            ),
            Err(e) => tracing::warn!(
                message_id = %message.id,
                chat_id = %chat.id,
                error = %e,
                "Platform delivery failed"
            ),
        }

        let (external_id, status, patch) = outcome_patch(&result);
        let updated =
            messages::record_delivery(&self.db, &message.id, external_id.as_deref(), status, &patch).await?;
        Ok(updated.unwrap_or(message))
    }
}

fn with_message_type(mut meta_data: serde_json::Value) -> serde_json::Value {
    if !meta_data.is_object() {
        meta_data = json!({});
    }
    if let Some(obj) = meta_data.as_object_mut() {
        obj.entry("message_type").or_insert_with(|| json!("text"));
    }
    meta_data
}

/// Translate a delivery result into `(external_id, status, meta_data patch)`.
pub fn outcome_patch(
    result: &Result<SendReceipt, PlatformError>,
) -> (Option<String>, DeliveryStatus, serde_json::Value) {
    match result {
        Ok(receipt) => (
            receipt.external_id.clone(),
            DeliveryStatus::Sent,
            json!({
                "platform_sent": true,
                "platform_status": receipt.platform_status,
                "platform_external_id": receipt.external_id,
                "sent_to": receipt.to,
                "sent_from": receipt.from,
            }),
        ),
        Err(e) => (
            None,
            DeliveryStatus::Failed,
            json!({
                "platform_sent": false,
                "platform_error": e.to_string(),
                "platform_error_code": e.status(),
                "platform_error_type": e.kind(),
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_patch() {
        let receipt = SendReceipt {
            external_id: Some("SM1".into()),
            platform_status: "queued".into(),
            to: "+1555".into(),
            from: Some("+1666".into()),
        };
        let (external_id, status, patch) = outcome_patch(&Ok(receipt));
        assert_eq!(external_id.as_deref(), Some("SM1"));
        assert_eq!(status, DeliveryStatus::Sent);
        assert_eq!(patch["platform_sent"], true);
        assert_eq!(patch["platform_status"], "queued");
        assert_eq!(patch["sent_to"], "+1555");
        assert_eq!(patch["sent_from"], "+1666");
    }

    #[test]
    fn test_failure_patch() {
        let err = PlatformError::NotSupported("INSTAGRAM".into());
        let (external_id, status, patch) = outcome_patch(&Err(err));
        assert!(external_id.is_none());
        assert_eq!(status, DeliveryStatus::Failed);
        assert_eq!(patch["platform_sent"], false);
        assert_eq!(patch["platform_error_type"], "not_supported");
        assert!(patch["platform_error_code"].is_null());
    }

    #[test]
    fn test_message_type_defaulted() {
        assert_eq!(with_message_type(json!(null))["message_type"], "text");
        let kept = with_message_type(json!({"message_type": "image", "x": 1}));
        assert_eq!(kept["message_type"], "image");
        assert_eq!(kept["x"], 1);
    }
}
