//! Whapi.Cloud WhatsApp webhooks.
//!
//! One webhook carries a `messages[]` batch. Each entry needs `id`, `type`,
//! `chat_id`, `timestamp` and `from`; text entries also need `text.body`.
//! Entries flagged `from_me` are echoes of our own sends and are skipped.

use serde_json::json;

use super::{BatchEntry, InboundEvent, InboundMessage, parse_timestamp, str_field};
use crate::PlatformError;

const REQUIRED_FIELDS: [&str; 5] = ["id", "type", "chat_id", "timestamp", "from"];

fn invalid(msg: String) -> PlatformError {
    PlatformError::InvalidPayload(msg)
}

fn validate(message: &serde_json::Value) -> Result<(), PlatformError> {
    if let Some(field) = REQUIRED_FIELDS.iter().find(|f| message.get(**f).is_none()) {
        return Err(invalid(format!("Whapi message missing required field: {field}")));
    }
    let is_text = message.get("type").and_then(|t| t.as_str()) == Some("text");
    if is_text && message.pointer("/text/body").is_none() {
        return Err(invalid("Whapi text message missing text.body".into()));
    }
    Ok(())
}

fn entry(message: &serde_json::Value) -> BatchEntry {
    let message_id = str_field(message, "id");
    if message.get("from_me").and_then(|v| v.as_bool()) == Some(true) {
        return BatchEntry::Skipped {
            message_external_id: message_id.map(str::to_string),
            reason: "outbound_message".into(),
        };
    }

    let from = str_field(message, "from").unwrap_or_default();
    let message_type = str_field(message, "type").unwrap_or("text");
    let content = if message_type == "text" {
        message
            .pointer("/text/body")
            .and_then(|b| b.as_str())
            .unwrap_or_default()
            .to_string()
    } else {
        format!("[{} MESSAGE]", message_type.to_uppercase())
    };
    let contact_name = str_field(message, "from_name").unwrap_or(from);
    let source = str_field(message, "source").unwrap_or("unknown");

    BatchEntry::Message(InboundMessage {
        chat_external_id: from.to_string(),
        contact_name: contact_name.to_string(),
        message_external_id: message_id.map(str::to_string),
        content,
        message_type: message_type.to_string(),
        timestamp: parse_timestamp(message.get("timestamp")),
        meta_data: json!({
            "platform": "WHAPI",
            "message_type": message_type,
            "source": source,
            "whapi_chat_id": str_field(message, "chat_id"),
            "from_number": from,
            "contact_name": contact_name,
        }),
    })
}

pub fn parse(body: &serde_json::Value) -> Result<InboundEvent, PlatformError> {
    let messages = body
        .get("messages")
        .and_then(|m| m.as_array())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| invalid("Whapi payload has empty or missing messages array".into()))?;

    // The whole batch is rejected if any entry is malformed.
    for message in messages {
        validate(message)?;
    }
    Ok(InboundEvent::Batch(messages.iter().map(entry).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(event: InboundEvent) -> Vec<BatchEntry> {
        match event {
            InboundEvent::Batch(entries) => entries,
            other => panic!("expected batch, got {other:?}"),
        }
    }

    fn text(id: &str, from_me: bool) -> serde_json::Value {
        json!({
            "id": id,
            "type": "text",
            "chat_id": "5511999990000@s.whatsapp.net",
            "timestamp": 1_700_000_000,
            "from": "5511999990000",
            "from_name": "Ana",
            "from_me": from_me,
            "source": "mobile",
            "text": {"body": "Oi!"},
        })
    }

    #[test]
    fn test_batch_skips_own_messages() {
        let body = json!({"messages": [text("m1", false), text("m2", true)]});
        let entries = batch(parse(&body).unwrap());
        assert_eq!(entries.len(), 2);

        let BatchEntry::Message(msg) = &entries[0] else {
            panic!("expected message, got {:?}", entries[0]);
        };
        assert_eq!(msg.chat_external_id, "5511999990000");
        assert_eq!(msg.contact_name, "Ana");
        assert_eq!(msg.content, "Oi!");
        assert_eq!(msg.message_external_id.as_deref(), Some("m1"));
        assert_eq!(msg.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(msg.meta_data["platform"], "WHAPI");
        assert_eq!(msg.meta_data["source"], "mobile");

        assert_eq!(
            entries[1],
            BatchEntry::Skipped {
                message_external_id: Some("m2".into()),
                reason: "outbound_message".into(),
            }
        );
    }

    #[test]
    fn test_non_text_gets_placeholder() {
        let body = json!({"messages": [{
            "id": "m3",
            "type": "image",
            "chat_id": "c",
            "timestamp": 1_700_000_000,
            "from": "5511",
        }]});
        let entries = batch(parse(&body).unwrap());
        let BatchEntry::Message(msg) = &entries[0] else {
            panic!("expected message");
        };
        assert_eq!(msg.content, "[IMAGE MESSAGE]");
        assert_eq!(msg.message_type, "image");
        assert_eq!(msg.contact_name, "5511");
        assert_eq!(msg.meta_data["source"], "unknown");
    }

    #[test]
    fn test_invalid_payloads() {
        for body in [
            json!({}),
            json!({"messages": []}),
            json!({"messages": [{"id": "m", "type": "text", "chat_id": "c", "timestamp": 1}]}),
            json!({"messages": [{"id": "m", "type": "text", "chat_id": "c", "timestamp": 1, "from": "1"}]}),
        ] {
            assert!(
                matches!(parse(&body), Err(PlatformError::InvalidPayload(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn test_missing_field_is_named() {
        let body = json!({"messages": [{"id": "m", "type": "text", "chat_id": "c", "timestamp": 1}]});
        let err = parse(&body).unwrap_err();
        assert!(err.to_string().contains("from"));
    }
}
