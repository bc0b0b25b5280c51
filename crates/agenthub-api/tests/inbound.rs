//! Inbound webhook intake against a real PostgreSQL database.

mod common;

use agenthub_common::ids;
use agenthub_common::models::{PlatformType, SenderType};
use agenthub_db::repository::{channels, chats, messages};
use axum::http::StatusCode;
use common::harness;
use serde_json::json;

fn whapi_text(id: &str, from: &str, body: &str, from_me: bool) -> serde_json::Value {
    json!({
        "id": id,
        "type": "text",
        "chat_id": format!("{from}@s.whatsapp.net"),
        "timestamp": 1_700_000_000,
        "from": from,
        "from_name": "Ana",
        "from_me": from_me,
        "source": "mobile",
        "text": {"body": body},
    })
}

#[tokio::test]
async fn test_whapi_batch_stores_contact_messages_and_skips_echoes() {
    let Some(h) = harness().await else { return };
    let channel_id = ids::generate(ids::CHANNEL);
    channels::create_channel(
        &h.db.pool,
        &channel_id,
        "Whapi line",
        PlatformType::Whapi,
        &json!({"token": "whapi-token"}),
        None,
    )
    .await
    .unwrap();

    // Unique sender so the chat is new for this test.
    let from = ids::generate("contact");
    let payload = json!({"messages": [
        whapi_text("wamid.in", &from, "Oi, tudo bem?", false),
        whapi_text("wamid.echo", &from, "Resposta enviada", true),
    ]});

    let (status, body) = h
        .post_json(&format!("/inbound/whapi/{channel_id}"), &payload)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "success");
    assert_eq!(body["processed_messages"], 2);

    let processed = &body["results"][0];
    assert_eq!(processed["status"], "processed");
    assert_eq!(processed["content_preview"], "Oi, tudo bem?");
    assert_eq!(
        body["results"][1],
        json!({"status": "skipped", "reason": "outbound_message"})
    );

    let message = messages::find_by_id(&h.db.pool, processed["message_id"].as_str().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.sender_type, SenderType::Contact);
    assert_eq!(message.external_id.as_deref(), Some("wamid.in"));
    assert_eq!(message.meta_data["platform"], "WHAPI");

    let chat = chats::find_in_channel(&h.db.pool, &channel_id, &message.chat_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chat.external_id, from);
    assert_eq!(chat.id, processed["chat_id"].as_str().unwrap());
}

#[tokio::test]
async fn test_whapi_empty_batch_rejected() {
    let Some(h) = harness().await else { return };
    let channel_id = ids::generate(ids::CHANNEL);
    channels::create_channel(
        &h.db.pool,
        &channel_id,
        "Whapi line",
        PlatformType::Whapi,
        &json!({"token": "whapi-token"}),
        None,
    )
    .await
    .unwrap();

    let (status, body) = h
        .post_json(&format!("/inbound/whapi/{channel_id}"), &json!({"messages": []}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
}
