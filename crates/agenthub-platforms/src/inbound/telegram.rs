//! Telegram Bot API updates.

use serde_json::json;

use super::{InboundEvent, InboundMessage, parse_timestamp, str_field};
use crate::PlatformError;

fn display_name(from: &serde_json::Value) -> Option<String> {
    let first = str_field(from, "first_name");
    let last = str_field(from, "last_name");
    match (first, last) {
        (Some(f), Some(l)) => Some(format!("{f} {l}")),
        (Some(f), None) => Some(f.to_string()),
        _ => str_field(from, "username").map(str::to_string),
    }
}

pub fn parse(body: &serde_json::Value) -> Result<InboundEvent, PlatformError> {
    let Some(message) = body.get("message") else {
        // edited_message, callback_query, my_chat_member, ...
        return Ok(InboundEvent::Ignored("update without message".into()));
    };

    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .map(|id| match id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .ok_or_else(|| PlatformError::InvalidPayload("message without chat.id".into()))?;

    let message_id = message.get("message_id").map(|id| match id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    });

    let (message_type, content) = if let Some(text) = str_field(message, "text") {
        ("text", text.to_string())
    } else if message.get("voice").is_some() {
        ("voice", "[Voice Message]".to_string())
    } else if message.get("photo").is_some() {
        let caption = str_field(message, "caption").unwrap_or_default();
        ("image", format!("[Image] {caption}").trim_end().to_string())
    } else if message.get("location").is_some() {
        let loc = &message["location"];
        ("location", format!("[Location] Lat: {}, Lon: {}", loc["latitude"], loc["longitude"]))
    } else {
        return Ok(InboundEvent::Ignored("message without supported content".into()));
    };

    let from = message.get("from").cloned().unwrap_or(serde_json::Value::Null);
    let contact_name = display_name(&from)
        .or_else(|| message.get("chat").and_then(|c| str_field(c, "title")).map(str::to_string))
        .unwrap_or_else(|| chat_id.clone());

    Ok(InboundEvent::Message(InboundMessage {
        chat_external_id: chat_id.clone(),
        contact_name,
        message_external_id: message_id.clone(),
        content,
        message_type: message_type.to_string(),
        timestamp: parse_timestamp(message.get("date")),
        meta_data: json!({
            "platform": "TELEGRAM",
            "message_type": message_type,
            "telegram_message_id": message_id,
            "telegram_chat_id": chat_id,
            "from": from,
            "update_id": body.get("update_id"),
        }),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_update() {
        let body = json!({
            "update_id": 10,
            "message": {
                "message_id": 42,
                "from": {"id": 7, "first_name": "Ada", "last_name": "L"},
                "chat": {"id": 7, "type": "private"},
                "date": 1_700_000_000,
                "text": "hi bot",
            }
        });
        let InboundEvent::Message(msg) = parse(&body).unwrap() else {
            panic!("expected message");
        };
        assert_eq!(msg.chat_external_id, "7");
        assert_eq!(msg.contact_name, "Ada L");
        assert_eq!(msg.message_external_id.as_deref(), Some("42"));
        assert_eq!(msg.content, "hi bot");
        assert_eq!(msg.timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_update_without_message_is_ignored() {
        let body = json!({"update_id": 11, "edited_message": {}});
        assert!(matches!(parse(&body).unwrap(), InboundEvent::Ignored(_)));
    }

    #[test]
    fn test_sticker_is_ignored() {
        let body = json!({"message": {"message_id": 1, "chat": {"id": 1}, "sticker": {}}});
        assert!(matches!(parse(&body).unwrap(), InboundEvent::Ignored(_)));
    }
}
