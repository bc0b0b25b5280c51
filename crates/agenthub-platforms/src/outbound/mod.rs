//! Outbound delivery: send a text message to a chat on its platform.

pub mod meta;
pub mod telegram;
pub mod twilio;
pub mod whapi;

use std::future::Future;

use agenthub_common::models::{Channel, PlatformType};
use serde::Serialize;

use crate::PlatformError;

/// What the platform told us after accepting a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendReceipt {
    /// Platform message ID (Telegram message_id, Twilio SID, Meta wamid, Whapi id).
    pub external_id: Option<String>,
    pub platform_status: String,
    pub to: String,
    pub from: Option<String>,
}

/// A platform that can deliver text to a conversation.
pub trait PlatformSender {
    fn send_text(
        &self,
        to: &str,
        text: &str,
    ) -> impl Future<Output = Result<SendReceipt, PlatformError>> + Send;
}

/// Deliver `text` to the conversation `to` on the channel's platform.
pub async fn send_text(
    client: &reqwest::Client,
    channel: &Channel,
    to: &str,
    text: &str,
) -> Result<SendReceipt, PlatformError> {
    match channel.platform {
        PlatformType::Telegram => {
            telegram::TelegramSender::from_channel(client.clone(), channel)?
                .send_text(to, text)
                .await
        }
        PlatformType::WhatsappTwilio => {
            twilio::TwilioSender::from_channel(client.clone(), channel)?
                .send_text(to, text)
                .await
        }
        PlatformType::Whatsapp => {
            meta::MetaSender::from_channel(client.clone(), channel)?
                .send_text(to, text)
                .await
        }
        PlatformType::Whapi => {
            whapi::WhapiSender::from_channel(client.clone(), channel)?
                .send_text(to, text)
                .await
        }
        PlatformType::Instagram => Err(PlatformError::NotSupported(channel.platform.to_string())),
    }
}

/// Read a required non-empty string from channel credentials.
pub(crate) fn credential<'a>(channel: &'a Channel, key: &str) -> Result<&'a str, PlatformError> {
    channel
        .credentials_to_send_message
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            PlatformError::InvalidConfig(format!(
                "{} channel missing credential '{key}'",
                channel.platform
            ))
        })
}

/// Pull a human-readable error out of a failed platform response.
pub(crate) async fn api_error(response: reqwest::Response, detail_key: &str) -> PlatformError {
    let status = response.status().as_u16();
    let detail = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| {
            body.get(detail_key)
                .or_else(|| body.get("error").and_then(|e| e.get(detail_key)))
                .and_then(|d| d.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("HTTP {status}"));
    PlatformError::Api { status, detail }
}

#[cfg(test)]
pub(crate) mod test_support {
    use agenthub_common::models::{Channel, PlatformType};
    use chrono::Utc;

    pub fn channel(platform: PlatformType, credentials: serde_json::Value, api: Option<String>) -> Channel {
        Channel {
            id: "channel_test".into(),
            name: "Test".into(),
            platform,
            credentials_to_send_message: credentials,
            api_to_send_message: api,
            created_at: Utc::now(),
        }
    }
}
