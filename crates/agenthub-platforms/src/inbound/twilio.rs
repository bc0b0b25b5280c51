//! Twilio WhatsApp webhooks (form-encoded, flattened to JSON by the caller).

use chrono::Utc;
use serde_json::json;

use super::{InboundEvent, InboundMessage, StatusUpdate, str_field};
use crate::PlatformError;

fn strip_prefix(number: &str) -> &str {
    number.strip_prefix("whatsapp:").unwrap_or(number)
}

/// Map a Twilio media content type onto a message type and display content.
fn describe_media(content_type: &str, url: &str) -> (String, String) {
    let kind = content_type.split('/').next().unwrap_or_default();
    match kind {
        "audio" => ("voice".into(), format!("[Voice Message] {url}")),
        "image" | "video" => (kind.into(), format!("[{} Message] {url}", kind.to_uppercase())),
        _ => ("media".into(), format!("[Media Message] {url}")),
    }
}

pub fn parse(body: &serde_json::Value) -> Result<InboundEvent, PlatformError> {
    // Status callbacks carry MessageStatus and no Body/media.
    if let (Some(status), Some(sid)) = (str_field(body, "MessageStatus"), str_field(body, "MessageSid")) {
        if str_field(body, "Body").is_none() && str_field(body, "MediaUrl0").is_none() {
            return Ok(InboundEvent::Status(StatusUpdate {
                message_external_id: sid.to_string(),
                status: status.to_string(),
            }));
        }
    }

    let from = str_field(body, "From")
        .map(strip_prefix)
        .ok_or_else(|| PlatformError::InvalidPayload("missing From".into()))?;
    let to = str_field(body, "To").map(strip_prefix);
    let sid = str_field(body, "MessageSid").or_else(|| str_field(body, "SmsMessageSid"));

    let (message_type, content) = match (str_field(body, "MediaUrl0"), str_field(body, "Body")) {
        (Some(url), text) => {
            let content_type = str_field(body, "MediaContentType0").unwrap_or("application/octet-stream");
            let (kind, described) = describe_media(content_type, url);
            match text {
                Some(caption) => (kind, format!("{described}\n{caption}")),
                None => (kind, described),
            }
        }
        (None, Some(text)) => ("text".to_string(), text.to_string()),
        (None, None) => {
            return Err(PlatformError::InvalidPayload("missing Body".into()));
        }
    };

    let contact_name = str_field(body, "ProfileName").unwrap_or(from).to_string();

    Ok(InboundEvent::Message(InboundMessage {
        chat_external_id: from.to_string(),
        contact_name,
        message_external_id: sid.map(str::to_string),
        content,
        message_type: message_type.clone(),
        timestamp: Utc::now(),
        meta_data: json!({
            "platform": "WHATSAPP_TWILIO",
            "message_type": message_type,
            "twilio_sid": sid,
            "from_number": from,
            "to_number": to,
            "media_url": str_field(body, "MediaUrl0"),
            "media_type": str_field(body, "MediaContentType0"),
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
            "From": "whatsapp:+15551234567",
            "To": "whatsapp:+15557654321",
            "Body": "Hello there",
            "MessageSid": "SM123",
            "ProfileName": "Jane",
        });
        let msg = message(parse(&body).unwrap());
        assert_eq!(msg.chat_external_id, "+15551234567");
        assert_eq!(msg.contact_name, "Jane");
        assert_eq!(msg.content, "Hello there");
        assert_eq!(msg.message_type, "text");
        assert_eq!(msg.message_external_id.as_deref(), Some("SM123"));
        assert_eq!(msg.meta_data["to_number"], "+15557654321");
    }

    #[test]
    fn test_voice_note() {
        let body = json!({
            "From": "whatsapp:+15551234567",
            "MessageSid": "SM124",
            "MediaUrl0": "https://api.twilio.com/media/1",
            "MediaContentType0": "audio/ogg",
        });
        let msg = message(parse(&body).unwrap());
        assert_eq!(msg.message_type, "voice");
        assert_eq!(msg.content, "[Voice Message] https://api.twilio.com/media/1");
        assert_eq!(msg.contact_name, "+15551234567");
    }

    #[test]
    fn test_image_with_caption() {
        let body = json!({
            "From": "whatsapp:+1555",
            "Body": "look",
            "MediaUrl0": "https://x/img",
            "MediaContentType0": "image/jpeg",
        });
        let msg = message(parse(&body).unwrap());
        assert_eq!(msg.message_type, "image");
        assert_eq!(msg.content, "[IMAGE Message] https://x/img\nlook");
    }

    #[test]
    fn test_status_callback() {
        let body = json!({"MessageSid": "SM9", "MessageStatus": "delivered", "From": "whatsapp:+1"});
        assert_eq!(
            parse(&body).unwrap(),
            InboundEvent::Status(StatusUpdate {
                message_external_id: "SM9".into(),
                status: "delivered".into()
            })
        );
    }

    #[test]
    fn test_missing_from_is_invalid() {
        assert!(matches!(
            parse(&json!({"Body": "hi"})),
            Err(PlatformError::InvalidPayload(_))
        ));
    }
}
