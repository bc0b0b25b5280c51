//! Twilio WhatsApp delivery through the Messages REST API.

use agenthub_common::models::Channel;

use super::{PlatformSender, SendReceipt, api_error, credential};
use crate::PlatformError;

pub struct TwilioSender {
    client: reqwest::Client,
    url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

fn whatsapp_address(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{number}")
    }
}

impl TwilioSender {
    /// Credentials: `{"user": "AC...", "token": "<auth token>", "from_number": "+1..."}`.
    pub fn from_channel(client: reqwest::Client, channel: &Channel) -> Result<Self, PlatformError> {
        let account_sid = credential(channel, "user")?.to_string();
        let url = channel.api_to_send_message.clone().unwrap_or_else(|| {
            format!("https://api.twilio.com/2010-04-01/Accounts/{account_sid}/Messages.json")
        });
        Ok(Self {
            client,
            url,
            auth_token: credential(channel, "token")?.to_string(),
            from_number: credential(channel, "from_number")?.to_string(),
            account_sid,
        })
    }
}

impl PlatformSender for TwilioSender {
    async fn send_text(&self, to: &str, text: &str) -> Result<SendReceipt, PlatformError> {
        let to_addr = whatsapp_address(to);
        let from_addr = whatsapp_address(&self.from_number);
        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to_addr.as_str()), ("From", from_addr.as_str()), ("Body", text)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response, "message").await);
        }

        let body: serde_json::Value = response.json().await?;
        let sid = body.get("sid").and_then(|s| s.as_str()).map(str::to_string);
        let platform_status = body
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("queued")
            .to_string();
        tracing::debug!(to = %to_addr, sid = ?sid, "Twilio message accepted");

        Ok(SendReceipt {
            external_id: sid,
            platform_status,
            to: to.to_string(),
            from: Some(self.from_number.clone()),
        })
    }
}
