//! Channel model: one messaging-platform account (a WhatsApp number, a Telegram bot, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlatformType {
    /// WhatsApp Cloud API (Meta)
    Whatsapp,
    /// WhatsApp through Twilio
    WhatsappTwilio,
    /// WhatsApp through the Whapi.Cloud gateway
    Whapi,
    Telegram,
    Instagram,
}

impl PlatformType {
    pub const ALL: [PlatformType; 5] = [
        Self::Whatsapp,
        Self::WhatsappTwilio,
        Self::Whapi,
        Self::Telegram,
        Self::Instagram,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whatsapp => "WHATSAPP",
            Self::WhatsappTwilio => "WHATSAPP_TWILIO",
            Self::Whapi => "WHAPI",
            Self::Telegram => "TELEGRAM",
            Self::Instagram => "INSTAGRAM",
        }
    }
}

impl fmt::Display for PlatformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for PlatformType {
    type Err = UnknownPlatform;

    /// Case-insensitive; `-` is accepted in place of `_` so URL paths like
    /// `/inbound/whatsapp-twilio/...` work.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub platform: PlatformType,
    /// Platform API secrets. Never sent to clients.
    #[serde(skip_serializing, default)]
    pub credentials_to_send_message: serde_json::Value,
    /// Optional override of the platform API base URL.
    pub api_to_send_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateChannelRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    pub platform: PlatformType,
    #[serde(default = "empty_object")]
    pub credentials_to_send_message: serde_json::Value,
    #[validate(url(message = "Invalid API URL"))]
    pub api_to_send_message: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateChannelRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub platform: Option<PlatformType>,
    pub credentials_to_send_message: Option<serde_json::Value>,
    #[validate(url(message = "Invalid API URL"))]
    pub api_to_send_message: Option<String>,
}

fn empty_object() -> serde_json::Value {
    serde_json::json!({})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_platform() {
        assert_eq!("WHATSAPP".parse::<PlatformType>(), Ok(PlatformType::Whatsapp));
        assert_eq!("telegram".parse::<PlatformType>(), Ok(PlatformType::Telegram));
        assert_eq!(
            "whatsapp-twilio".parse::<PlatformType>(),
            Ok(PlatformType::WhatsappTwilio)
        );
        assert_eq!("whapi".parse::<PlatformType>(), Ok(PlatformType::Whapi));
        assert_eq!(
            "FAX".parse::<PlatformType>(),
            Err(UnknownPlatform("FAX".into()))
        );
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for p in PlatformType::ALL {
            let json = serde_json::to_value(p).unwrap();
            assert_eq!(json, p.as_str());
        }
    }

    #[test]
    fn test_credentials_never_serialized() {
        let channel = Channel {
            id: "channel_abc".into(),
            name: "Support".into(),
            platform: PlatformType::Telegram,
            credentials_to_send_message: serde_json::json!({"bot_token": "123:secret"}),
            api_to_send_message: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&channel).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("credentials_to_send_message"));
    }
}
