//! WhatsApp Cloud API (Meta) delivery.

use agenthub_common::models::Channel;
use serde_json::json;

use super::{PlatformSender, SendReceipt, api_error, credential};
use crate::PlatformError;

pub const DEFAULT_API_BASE: &str = "https://graph.facebook.com/v18.0";

pub struct MetaSender {
    client: reqwest::Client,
    api_base: String,
    token: String,
    phone_number_id: String,
}

impl MetaSender {
    /// Credentials: `{"token": "<system user token>", "phone_number_id": "..."}`.
    pub fn from_channel(client: reqwest::Client, channel: &Channel) -> Result<Self, PlatformError> {
        Ok(Self {
            client,
            api_base: channel
                .api_to_send_message
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            token: credential(channel, "token")?.to_string(),
            phone_number_id: credential(channel, "phone_number_id")?.to_string(),
        })
    }
}

/// Meta expects E.164 digits without `+`.
fn digits_only(number: &str) -> String {
    number.chars().filter(char::is_ascii_digit).collect()
}

impl PlatformSender for MetaSender {
    async fn send_text(&self, to: &str, text: &str) -> Result<SendReceipt, PlatformError> {
        let recipient = digits_only(to);
        if recipient.is_empty() {
            return Err(PlatformError::InvalidPayload(format!("'{to}' is not a phone number")));
        }

        let url = format!(
            "{}/{}/messages",
            self.api_base.trim_end_matches('/'),
            self.phone_number_id
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": recipient,
                "type": "text",
                "text": {"body": text},
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response, "message").await);
        }

        let body: serde_json::Value = response.json().await?;
        let external_id = body
            .get("messages")
            .and_then(|m| m.get(0))
            .and_then(|m| m.get("id"))
            .and_then(|id| id.as_str())
            .map(str::to_string);
        tracing::debug!(to = %recipient, wamid = ?external_id, "Meta message sent");

        Ok(SendReceipt {
            external_id,
            platform_status: "sent".into(),
            to: recipient,
            from: Some(self.phone_number_id.clone()),
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
            .mock("POST", "/PNID/messages")
            .match_header("authorization", "Bearer meta-token")
            .match_body(mockito::Matcher::PartialJson(json!({
                "messaging_product": "whatsapp",
                "to": "5511999990000",
                "text": {"body": "Olá"},
            })))
            .with_status(200)
            .with_body(r#"{"messages":[{"id":"wamid.abc"}]}"#)
            .create_async()
            .await;

        let ch = channel(
            PlatformType::Whatsapp,
            json!({"token": "meta-token", "phone_number_id": "PNID"}),
            Some(server.url()),
        );
        let sender = MetaSender::from_channel(reqwest::Client::new(), &ch).unwrap();
        let receipt = sender.send_text("+55 11 99999-0000", "Olá").await.unwrap();

        assert_eq!(receipt.external_id.as_deref(), Some("wamid.abc"));
        assert_eq!(receipt.to, "5511999990000");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/PNID/messages")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Invalid OAuth access token"}}"#)
            .create_async()
            .await;

        let ch = channel(
            PlatformType::Whatsapp,
            json!({"token": "bad", "phone_number_id": "PNID"}),
            Some(server.url()),
        );
        let sender = MetaSender::from_channel(reqwest::Client::new(), &ch).unwrap();
        let err = sender.send_text("5511", "x").await.unwrap_err();
        assert_eq!(err.kind(), "http_error");
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("Invalid OAuth access token"));
    }
}
