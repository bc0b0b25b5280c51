//! Inbound webhook normalization.
//!
//! Every platform posts a different shape. Parsers turn a decoded body into an
//! [`InboundEvent`]; persisting it is the caller's job.

pub mod meta;
pub mod telegram;
pub mod twilio;
pub mod whapi;

use agenthub_common::models::PlatformType;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::PlatformError;

/// A customer message received from a platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InboundMessage {
    /// Platform conversation key; becomes `Chat.external_id`.
    pub chat_external_id: String,
    /// Display name for a newly created chat.
    pub contact_name: String,
    /// Platform message ID; becomes `Message.external_id`.
    pub message_external_id: Option<String>,
    pub content: String,
    /// `text`, `image`, `voice`, `location`, ...
    pub message_type: String,
    pub timestamp: DateTime<Utc>,
    /// Platform specifics stored in `Message.meta_data`.
    pub meta_data: serde_json::Value,
}

/// A delivery status callback for a message the hub sent earlier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub message_external_id: String,
    pub status: String,
}

/// One entry of a webhook that carries several messages.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEntry {
    Message(InboundMessage),
    /// Echo of a message the channel itself sent.
    Skipped {
        message_external_id: Option<String>,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Message(InboundMessage),
    Status(StatusUpdate),
    Batch(Vec<BatchEntry>),
    /// A valid webhook that carries nothing to store (edits, joins, ...).
    Ignored(String),
}

/// Parse a webhook body for `platform`.
///
/// Form-encoded bodies must be converted to a flat JSON object first.
pub fn parse(platform: PlatformType, body: &serde_json::Value) -> Result<InboundEvent, PlatformError> {
    match platform {
        PlatformType::WhatsappTwilio => twilio::parse(body),
        PlatformType::Whatsapp => meta::parse(body),
        PlatformType::Whapi => whapi::parse(body),
        PlatformType::Telegram => telegram::parse(body),
        PlatformType::Instagram => Err(PlatformError::NotSupported(platform.to_string())),
    }
}

/// Whether the platform has an inbound handler at all.
pub fn is_supported(platform: PlatformType) -> bool {
    !matches!(platform, PlatformType::Instagram)
}

pub(crate) fn str_field<'a>(body: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

/// Accept unix seconds (number or numeric string) or RFC 3339; anything else is "now".
pub(crate) fn parse_timestamp(value: Option<&serde_json::Value>) -> DateTime<Utc> {
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        Some(serde_json::Value::String(s)) => s
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .or_else(|| {
                DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
        _ => None,
    };
    parsed.unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_instagram_is_not_supported() {
        let err = parse(PlatformType::Instagram, &json!({})).unwrap_err();
        assert!(matches!(err, PlatformError::NotSupported(_)));
        assert!(!is_supported(PlatformType::Instagram));
        assert!(is_supported(PlatformType::Telegram));
        assert!(is_supported(PlatformType::Whapi));
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let ts = parse_timestamp(Some(&json!(1_700_000_000)));
        assert_eq!(ts.timestamp(), 1_700_000_000);
        let ts = parse_timestamp(Some(&json!("1700000000")));
        assert_eq!(ts.timestamp(), 1_700_000_000);
        let ts = parse_timestamp(Some(&json!("2024-01-02T03:04:05Z")));
        assert_eq!(ts.timestamp(), 1_704_164_645);
        let before = Utc::now();
        assert!(parse_timestamp(Some(&json!("garbage"))) >= before);
    }
}
