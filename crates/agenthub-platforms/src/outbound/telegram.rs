//! Telegram Bot API `sendMessage`.

use agenthub_common::models::Channel;
use serde_json::json;

use super::{PlatformSender, SendReceipt, api_error, credential};
use crate::PlatformError;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

pub struct TelegramSender {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl TelegramSender {
    /// Credentials: `{"token": "<bot token>"}`.
    pub fn from_channel(client: reqwest::Client, channel: &Channel) -> Result<Self, PlatformError> {
        Ok(Self {
            client,
            api_base: channel
                .api_to_send_message
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            bot_token: credential(channel, "token")?.to_string(),
        })
    }
}

impl PlatformSender for TelegramSender {
    async fn send_text(&self, to: &str, text: &str) -> Result<SendReceipt, PlatformError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        );
        let response = self
            .client
            .post(&url)
            .json(&json!({"chat_id": to, "text": text, "parse_mode": "HTML"}))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response, "description").await);
        }

        let status = response.status().as_u16();
        let body: serde_json::Value = response.json().await?;
        if body.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let detail = body
                .get("description")
                .and_then(|d| d.as_str())
                .unwrap_or("Unknown error")
                .to_string();
            return Err(PlatformError::Api { status, detail });
        }

        let external_id = body
            .get("result")
            .and_then(|r| r.get("message_id"))
            .map(|id| id.to_string());
        tracing::debug!(chat = %to, message_id = ?external_id, "Telegram message sent");

        Ok(SendReceipt {
            external_id,
            platform_status: "sent".into(),
            to: to.to_string(),
            from: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::test_support::channel;
    use agenthub_common::models::PlatformType;

    #[tokio::test]
    async fn test_send_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_body(mockito::Matcher::PartialJson(
                json!({"chat_id": "42", "text": "hello", "parse_mode": "HTML"}),
            ))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{"message_id":99}}"#)
            .create_async()
            .await;

        let ch = channel(PlatformType::Telegram, json!({"token": "123:abc"}), Some(server.url()));
        let sender = TelegramSender::from_channel(reqwest::Client::new(), &ch).unwrap();
        let receipt = sender.send_text("42", "hello").await.unwrap();

        assert_eq!(receipt.external_id.as_deref(), Some("99"));
        assert_eq!(receipt.to, "42");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_description() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/botT/sendMessage")
            .with_status(400)
            .with_body(r#"{"ok":false,"description":"Bad Request: chat not found"}"#)
            .create_async()
            .await;

        let ch = channel(PlatformType::Telegram, json!({"token": "T"}), Some(server.url()));
        let sender = TelegramSender::from_channel(reqwest::Client::new(), &ch).unwrap();
        let err = sender.send_text("1", "x").await.unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("chat not found"));
    }
}
