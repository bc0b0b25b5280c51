//! Whapi.Cloud `POST /messages/text`.

use agenthub_common::models::Channel;
use serde_json::json;

use super::{PlatformSender, SendReceipt, api_error, credential};
use crate::PlatformError;

pub const DEFAULT_API_BASE: &str = "https://gate.whapi.cloud";

/// Seconds of "typing..." shown before the message, about five characters a second.
pub fn typing_time(text: &str) -> u64 {
    let chars = text.chars().count() as u64;
    (chars / 5).clamp(1, 30)
}

/// Whapi wants bare digits: no `+`, spaces or JID suffix.
fn recipient(to: &str) -> String {
    let number = to.split('@').next().unwrap_or_default();
    number.chars().filter(char::is_ascii_digit).collect()
}

pub struct WhapiSender {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl WhapiSender {
    /// Credentials: `{"token": "<whapi channel token>"}`.
    pub fn from_channel(client: reqwest::Client, channel: &Channel) -> Result<Self, PlatformError> {
        Ok(Self {
            client,
            api_base: channel
                .api_to_send_message
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            token: credential(channel, "token")?.to_string(),
        })
    }
}

impl PlatformSender for WhapiSender {
    async fn send_text(&self, to: &str, text: &str) -> Result<SendReceipt, PlatformError> {
        let number = recipient(to);
        if number.is_empty() {
            return Err(PlatformError::InvalidPayload(
                "No recipient phone number found in chat".into(),
            ));
        }

        let url = format!("{}/messages/text", self.api_base.trim_end_matches('/'));
        let typing = typing_time(text);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({"to": number, "body": text, "typing_time": typing}))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response, "message").await);
        }

        let body: serde_json::Value = response.json().await?;
        let external_id = body
            .get("id")
            .or_else(|| body.pointer("/message/id"))
            .and_then(|id| id.as_str())
            .map(str::to_string);
        tracing::debug!(
            to = %number,
            message_id = ?external_id,
            typing_time = typing,
            "Whapi message sent"
        );

        Ok(SendReceipt {
            external_id,
            platform_status: "sent".into(),
            to: number,
            from: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::test_support::channel;
    use agenthub_common::models::PlatformType;

    #[test]
    fn test_typing_time_bounds() {
        assert_eq!(typing_time(""), 1);
        assert_eq!(typing_time("hello world, how are you?"), 5);
        assert_eq!(typing_time(&"x".repeat(1000)), 30);
    }

    #[test]
    fn test_recipient_is_bare_digits() {
        assert_eq!(recipient("+55 11 99999-0000"), "5511999990000");
        assert_eq!(recipient("5511999990000@s.whatsapp.net"), "5511999990000");
        assert_eq!(recipient("abc"), "");
    }

    #[tokio::test]
    async fn test_send_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/messages/text")
            .match_header("authorization", "Bearer whapi-token")
            .match_body(mockito::Matcher::PartialJson(
                json!({"to": "5511999990000", "body": "Olá!", "typing_time": 1}),
            ))
            .with_status(200)
            .with_body(r#"{"sent":true,"message":{"id":"PsqXn5Smsc-1"}}"#)
            .create_async()
            .await;

        let ch = channel(PlatformType::Whapi, json!({"token": "whapi-token"}), Some(server.url()));
        let sender = WhapiSender::from_channel(reqwest::Client::new(), &ch).unwrap();
        let receipt = sender.send_text("+5511999990000", "Olá!").await.unwrap();

        assert_eq!(receipt.external_id.as_deref(), Some("PsqXn5Smsc-1"));
        assert_eq!(receipt.to, "5511999990000");
        assert_eq!(receipt.platform_status, "sent");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/messages/text")
            .with_status(401)
            .with_body(r#"{"error":{"code":401,"message":"Invalid token"}}"#)
            .create_async()
            .await;

        let ch = channel(PlatformType::Whapi, json!({"token": "bad"}), Some(server.url()));
        let sender = WhapiSender::from_channel(reqwest::Client::new(), &ch).unwrap();
        let err = sender.send_text("5511", "x").await.unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("Invalid token"));
    }

    #[tokio::test]
    async fn test_missing_recipient_never_calls_api() {
        let ch = channel(PlatformType::Whapi, json!({"token": "t"}), Some("http://127.0.0.1:1".into()));
        let sender = WhapiSender::from_channel(reqwest::Client::new(), &ch).unwrap();
        let err = sender.send_text("", "x").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_payload");
    }

    #[test]
    fn test_token_required() {
        let ch = channel(PlatformType::Whapi, json!({}), None);
        assert!(WhapiSender::from_channel(reqwest::Client::new(), &ch).is_err());
    }
}
