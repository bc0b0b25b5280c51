//! Messages exchanged with WebSocket clients.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

/// What a client may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping {
        #[serde(default)]
        timestamp: serde_json::Value,
    },
    /// `channels` holds chat or channel IDs.
    Subscribe {
        #[serde(default)]
        channels: Vec<String>,
    },
}

/// Result of decoding one text frame.
#[derive(Debug, PartialEq)]
pub enum Incoming {
    Message(ClientMessage),
    UnknownType(Option<String>),
    InvalidJson,
}

pub fn decode(text: &str) -> Incoming {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return Incoming::InvalidJson;
    };
    let kind = value.get("type").and_then(|t| t.as_str()).map(str::to_string);
    match serde_json::from_value::<ClientMessage>(value) {
        Ok(msg) => Incoming::Message(msg),
        Err(_) => Incoming::UnknownType(kind),
    }
}

pub fn connection_established(active_connections: usize) -> serde_json::Value {
    json!({
        "type": "connection_established",
        "message": "WebSocket connection established successfully",
        "active_connections": active_connections,
    })
}

pub fn pong(timestamp: serde_json::Value) -> serde_json::Value {
    json!({
        "type": "pong",
        "timestamp": timestamp,
        "server_time": Utc::now().to_rfc3339(),
    })
}

pub fn subscription_ack(subscribed_to: &[String]) -> serde_json::Value {
    json!({
        "type": "subscription_ack",
        "subscribed_to": subscribed_to,
    })
}
