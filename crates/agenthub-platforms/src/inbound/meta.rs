//! Meta WhatsApp Cloud API webhooks.
//!
//! The hub expects the flattened shape produced by the Meta relay:
//! a message `{message_id, from_number, timestamp, message_type, ...}` or a
//! status `{message_id, status}`.

use serde_json::json;

use super::{InboundEvent, InboundMessage, StatusUpdate, parse_timestamp, str_field};
use crate::PlatformError;

const MEDIA_TYPES: [&str; 4] = ["image", "video", "audio", "document"];

/// A status webhook has `status` and no `message_type`.
pub fn is_status_webhook(body: &serde_json::Value) -> bool {
    body.get("status").is_some() && body.get("message_type").is_none()
}

fn invalid(msg: &str) -> PlatformError {
    PlatformError::InvalidPayload(msg.to_string())
}

pub fn parse(body: &serde_json::Value) -> Result<InboundEvent, PlatformError> {
    if is_status_webhook(body) {
        let message_id = str_field(body, "message_id").ok_or_else(|| invalid("missing message_id"))?;
        let status = str_field(body, "status").ok_or_else(|| invalid("missing status"))?;
        return Ok(InboundEvent::Status(StatusUpdate {
            message_external_id: message_id.to_string(),
            status: status.to_string(),
        }));
    }

    let message_id = str_field(body, "message_id").ok_or_else(|| invalid("missing message_id"))?;
    let from_number = str_field(body, "from_number")
        .ok_or_else(|| invalid("missing from_number"))?
        .replace('+', "");
    if body.get("timestamp").is_none() {
        return Err(invalid("missing timestamp"));
    }
    let message_type = str_field(body, "message_type").ok_or_else(|| invalid("missing message_type"))?;

    let media_url = str_field(body, "media_url");
    let content = match message_type {
        "text" => str_field(body, "text_content")
            .ok_or_else(|| invalid("text message without text_content"))?
            .to_string(),
        "document" => {
            media_url.ok_or_else(|| invalid("document message without media_url"))?;
            format!("[Document] {}", str_field(body, "media_filename").unwrap_or("Unknown"))
        }
        kind if MEDIA_TYPES.contains(&kind) => {
            let url = media_url.ok_or_else(|| invalid("media message without media_url"))?;
            let mut label = kind.to_string();
            label[..1].make_ascii_uppercase();
            format!("[{label}] {url}")
        }
        "location" => {
            let (Some(lat), Some(lon)) = (body.get("latitude"), body.get("longitude")) else {
                return Err(invalid("location message without coordinates"));
            };
            format!("[Location] Lat: {lat}, Lon: {lon}")
        }
        other => format!("[{} Message]", other.to_uppercase()),
    };

    let contact_name = str_field(body, "contact_name")
        .map(str::to_string)
        .unwrap_or_else(|| from_number.clone());

    Ok(InboundEvent::Message(InboundMessage {
        chat_external_id: from_number.clone(),
        contact_name: contact_name.clone(),
        message_external_id: Some(message_id.to_string()),
        content,
        message_type: message_type.to_string(),
        timestamp: parse_timestamp(body.get("timestamp")),
        meta_data: json!({
            "platform": "WHATSAPP",
            "message_type": message_type,
            "meta_message_id": message_id,
            "from_number": from_number,
            "contact_name": contact_name,
            "media_url": media_url,
            "media_type": str_field(body, "media_type"),
            "media_filename": str_field(body, "media_filename"),
            "latitude": body.get("latitude"),
            "longitude": body.get("longitude"),
        }),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(event: InboundEvent) -> InboundMessage {
        match event {
            InboundEvent::Message(m) => m,
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn test_text_message() {
        let body = json!({
            "message_id": "wamid.1",
            "from_number": "+5511999990000",
            "contact_name": "Ana",
            "timestamp": 1_700_000_000,
            "message_type": "text",
            "text_content": "Oi!",
        });
        let msg = message(parse(&body).unwrap());
        assert_eq!(msg.chat_external_id, "5511999990000");
        assert_eq!(msg.contact_name, "Ana");
        assert_eq!(msg.content, "Oi!");
        assert_eq!(msg.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(msg.message_external_id.as_deref(), Some("wamid.1"));
    }

    #[test]
    fn test_image_message() {
        let body = json!({
            "message_id": "wamid.2",
            "from_number": "5511",
            "timestamp": "1700000000",
            "message_type": "image",
            "media_url": "https://cdn/img.jpg",
        });
        let msg = message(parse(&body).unwrap());
        assert_eq!(msg.content, "[Image] https://cdn/img.jpg");
        assert_eq!(msg.contact_name, "5511");
    }

    #[test]
    fn test_location_message() {
        let body = json!({
            "message_id": "wamid.3",
            "from_number": "5511",
            "timestamp": 1,
            "message_type": "location",
            "latitude": -23.5,
            "longitude": -46.6,
        });
        let msg = message(parse(&body).unwrap());
        assert_eq!(msg.content, "[Location] Lat: -23.5, Lon: -46.6");
    }

    #[test]
    fn test_status_webhook() {
        let body = json!({"message_id": "wamid.1", "status": "read"});
        assert!(is_status_webhook(&body));
        assert_eq!(
            parse(&body).unwrap(),
            InboundEvent::Status(StatusUpdate {
                message_external_id: "wamid.1".into(),
                status: "read".into()
            })
        );
    }

    #[test]
    fn test_text_without_content_is_invalid() {
        let body = json!({
            "message_id": "wamid.4",
            "from_number": "5511",
            "timestamp": 1,
            "message_type": "text",
        });
        assert!(matches!(parse(&body), Err(PlatformError::InvalidPayload(_))));
    }
}
