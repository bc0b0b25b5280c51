//! Inbound webhooks: messages and status callbacks pushed by messaging
//! platforms, plus asynchronous replies from agents.

use std::sync::Arc;

use agenthub_common::{
    error::{HubError, HubResult},
    ids,
    models::{
        Channel, DeliveryStatus, Message, NewMessage, PlatformType, SendMessageRequest, SenderType,
    },
    validation::validate_request,
};
use agenthub_db::repository::{agents, chat_agents, chats, messages};
use agenthub_platforms::{
    PlatformError,
    inbound::{self, BatchEntry, InboundEvent, InboundMessage, StatusUpdate},
    signature,
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path, State},
    http::{HeaderMap, header},
    middleware,
    routing::post,
};
use chrono::Utc;
use serde_json::json;

use crate::{AppState, middleware::AuthContext, routes::chats::post_chat_message};

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let agent_replies = Router::new()
        .route("/inbound/agent/{chat_id}", post(receive_agent_reply))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth_middleware,
        ));

    Router::new()
        .route("/inbound/{platform}/{channel_id}", post(receive_inbound))
        .merge(agent_replies)
}

/// Decode a webhook body. Twilio posts forms, everyone else JSON; without a
/// usable content type both are tried.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> HubResult<serde_json::Value> {
    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
    if content_type.contains("application/json") {
        return serde_json::from_slice(body)
            .map_err(|e| HubError::BadRequest(format!("Invalid JSON body: {e}")));
    }
    if content_type.contains("application/x-www-form-urlencoded") {
        return Ok(form_to_json(body));
    }
    Ok(serde_json::from_slice(body).unwrap_or_else(|_| form_to_json(body)))
}

fn form_to_json(body: &[u8]) -> serde_json::Value {
    let map = url::form_urlencoded::parse(body)
        .map(|(k, v)| (k.into_owned(), serde_json::Value::String(v.into_owned())))
        .collect::<serde_json::Map<_, _>>();
    serde_json::Value::Object(map)
}

fn platform_error(e: PlatformError) -> HubError {
    match e {
        PlatformError::NotSupported(p) => {
            HubError::NotImplemented(format!("Inbound messages for {p} are not supported yet"))
        }
        other => HubError::BadRequest(other.to_string()),
    }
}

/// Reject Meta webhooks whose signature does not match the channel's app secret.
fn check_signature(channel: &Channel, headers: &HeaderMap, body: &[u8]) -> HubResult<()> {
    let Some(secret) = channel
        .credentials_to_send_message
        .get("app_secret")
        .and_then(|s| s.as_str())
        .filter(|s| !s.is_empty())
    else {
        return Ok(());
    };

    let header_value = headers
        .get(signature::META_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if signature::verify_meta_signature(secret, body, header_value) {
        Ok(())
    } else {
        tracing::warn!(channel_id = %channel.id, "Rejected webhook with invalid signature");
        Err(HubError::InvalidToken)
    }
}

/// POST /inbound/{platform}/{channel_id} — platform webhook
async fn receive_inbound(
    State(state): State<Arc<AppState>>,
    Path((platform, channel_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> HubResult<Json<serde_json::Value>> {
    tracing::info!(%platform, %channel_id, "Inbound webhook received");

    let platform: PlatformType = platform
        .parse()
        .map_err(|_| HubError::UnsupportedPlatform(platform.clone()))?;

    let channel = agenthub_db::repository::channels::find_by_id(&state.db.pool, &channel_id)
        .await?
        .ok_or_else(|| HubError::NotFoundDetail(format!("Channel {channel_id} not found")))?;

    if channel.platform != platform {
        return Err(HubError::BadRequest(format!(
            "Platform mismatch. Channel is {}, received {platform}",
            channel.platform
        )));
    }
    if !inbound::is_supported(platform) {
        return Err(HubError::NotImplemented(format!(
            "Inbound messages for {platform} are not supported yet"
        )));
    }

    if platform == PlatformType::Whatsapp {
        check_signature(&channel, &headers, &body)?;
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let payload = decode_body(content_type, &body)?;

    let response = match inbound::parse(platform, &payload).map_err(platform_error)? {
        InboundEvent::Message(msg) => store_inbound_message(&state, &channel, msg).await?,
        InboundEvent::Status(update) => apply_status(&state, update).await?,
        InboundEvent::Batch(entries) => store_batch(&state, &channel, entries).await?,
        InboundEvent::Ignored(reason) => {
            tracing::debug!(%channel_id, %reason, "Inbound webhook ignored");
            json!({"status": "ignored", "reason": reason})
        }
    };

    Ok(Json(response))
}

async fn store_inbound_message(
    state: &AppState,
    channel: &Channel,
    msg: InboundMessage,
) -> HubResult<serde_json::Value> {
    let message = persist_inbound(state, channel, msg).await?;
    Ok(json!({
        "status": "success",
        "chat_id": message.chat_id,
        "message_id": message.id,
        "message_type": message.message_type(),
    }))
}

/// Store every message of a batch webhook, reporting one result per entry.
async fn store_batch(
    state: &AppState,
    channel: &Channel,
    entries: Vec<BatchEntry>,
) -> HubResult<serde_json::Value> {
    let mut results = Vec::with_capacity(entries.len());
    for entry in entries {
        let result = match entry {
            BatchEntry::Message(msg) => {
                let message = persist_inbound(state, channel, msg).await?;
                let preview: String = message.content.chars().take(50).collect();
                json!({
                    "status": "processed",
                    "message_id": message.id,
                    "chat_id": message.chat_id,
                    "content_preview": preview,
                })
            }
            BatchEntry::Skipped {
                message_external_id,
                reason,
            } => {
                tracing::info!(
                    channel_id = %channel.id,
                    ?message_external_id,
                    "Skipping outbound message echo"
                );
                json!({"status": "skipped", "reason": reason})
            }
        };
        results.push(result);
    }

    Ok(json!({
        "status": "success",
        "processed_messages": results.len(),
        "results": results,
    }))
}

/// Create the chat if needed, store the message, notify operators and queue
/// agent dispatch.
async fn persist_inbound(
    state: &AppState,
    channel: &Channel,
    msg: InboundMessage,
) -> HubResult<Message> {
    let pool = &state.db.pool;

    let chat_meta = json!({
        "platform": channel.platform,
        "contact_name": msg.contact_name,
    });
    let (chat, created) = chats::get_or_create(
        pool,
        &ids::generate(ids::CHAT),
        &channel.id,
        &msg.chat_external_id,
        &msg.contact_name,
        &chat_meta,
    )
    .await?;

    if created {
        let candidates = agents::list_dispatchable(pool).await?;
        for agent in &candidates {
            chat_agents::create_link(
                pool,
                &ids::generate(ids::CHAT_AGENT),
                &chat.id,
                &agent.id,
                agent.activate_for_new_conversation,
            )
            .await?;
        }
        tracing::info!(chat_id = %chat.id, agents = candidates.len(), "New chat created");
    }

    let mut meta = msg.meta_data;
    if !meta.is_object() {
        meta = json!({});
    }
    if let Some(obj) = meta.as_object_mut() {
        obj.insert("message_type".into(), json!(msg.message_type));
    }

    let message = messages::create_message(
        pool,
        &ids::generate(ids::MESSAGE),
        &NewMessage {
            chat_id: chat.id.clone(),
            content: msg.content,
            sender_type: SenderType::Contact,
            external_id: msg.message_external_id,
            timestamp: msg.timestamp,
            meta_data: meta,
            delivery_status: DeliveryStatus::Sent,
        },
    )
    .await?;

    let chat = chats::touch_last_message(
        pool,
        &chat.id,
        message.timestamp,
        SenderType::Contact,
        &message.content,
    )
    .await?;
    state.delivery.notify(&chat, &message);

    let links = chat_agents::list_active_for_chat(pool, &chat.id).await?;
    for link in &links {
        state.dispatcher.enqueue(&link.id, &message.id).await;
    }

    tracing::info!(
        chat_id = %chat.id,
        message_id = %message.id,
        dispatched = links.len(),
        "Inbound message stored"
    );

    Ok(message)
}

async fn apply_status(state: &AppState, update: StatusUpdate) -> HubResult<serde_json::Value> {
    let Some(status) = DeliveryStatus::from_platform(&update.status) else {
        tracing::debug!(status = %update.status, "Unknown delivery status ignored");
        let reason = format!("unknown status {}", update.status);
        return Ok(json!({"status": "ignored", "reason": reason}));
    };

    let entry = json!({"status": update.status, "timestamp": Utc::now()});
    let updated =
        messages::apply_status_update(&state.db.pool, &update.message_external_id, status, &entry)
            .await?;

    Ok(json!({
        "status": "success",
        "message_id": update.message_external_id,
        "delivery_status": status,
        "updated": updated,
    }))
}

/// POST /inbound/agent/{chat_id} — asynchronous reply from an agent
async fn receive_agent_reply(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> HubResult<Json<Message>> {
    let agent = auth
        .agent()
        .ok_or_else(|| HubError::forbidden("Agent token required"))?;
    validate_request(&body)?;

    let chat = chats::find_by_id(&state.db.pool, &chat_id)
        .await?
        .ok_or_else(|| HubError::not_found("Chat"))?;

    let assigned = chat_agents::find_for_chat(&state.db.pool, &chat_id, &agent.id)
        .await?
        .is_some_and(|link| link.active);
    if !assigned {
        return Err(HubError::forbidden("Agent is not active on this chat"));
    }

    Ok(Json(post_chat_message(&state, &auth, &chat, body).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{app, send};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    #[test]
    fn test_decode_twilio_form() {
        let body = b"From=whatsapp%3A%2B15551234567&Body=Hello+there&MessageSid=SM1";
        let value = decode_body(Some("application/x-www-form-urlencoded"), body).unwrap();
        assert_eq!(value["From"], "whatsapp:+15551234567");
        assert_eq!(value["Body"], "Hello there");
        assert_eq!(value["MessageSid"], "SM1");
    }

    #[test]
    fn test_decode_json_and_fallbacks() {
        let value = decode_body(Some("application/json"), br#"{"message_id":"m1"}"#).unwrap();
        assert_eq!(value["message_id"], "m1");

        let err = decode_body(Some("application/json"), b"{broken").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let sniffed = decode_body(None, br#"{"update_id":1}"#).unwrap();
        assert_eq!(sniffed["update_id"], 1);
        let sniffed_form = decode_body(None, b"Body=hi").unwrap();
        assert_eq!(sniffed_form["Body"], "hi");
    }

    #[test]
    fn test_instagram_maps_to_not_implemented() {
        let err = platform_error(PlatformError::NotSupported("INSTAGRAM".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_IMPLEMENTED);
        let err = platform_error(PlatformError::InvalidPayload("missing From".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    fn channel(credentials: serde_json::Value) -> Channel {
        Channel {
            id: "channel_wa".into(),
            name: "Support".into(),
            platform: PlatformType::Whatsapp,
            credentials_to_send_message: credentials,
            api_to_send_message: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_signature_checked_only_with_app_secret() {
        let body = br#"{"message_id":"m1"}"#;
        let open = channel(json!({"token": "t"}));
        assert!(check_signature(&open, &HeaderMap::new(), body).is_ok());

        let locked = channel(json!({"app_secret": "s3cret"}));
        assert!(check_signature(&locked, &HeaderMap::new(), body).is_err());

        let mut headers = HeaderMap::new();
        let signed = signature::sign_meta_payload("s3cret", body);
        headers.insert(signature::META_SIGNATURE_HEADER, signed.parse().unwrap());
        assert!(check_signature(&locked, &headers, body).is_ok());
    }

    #[tokio::test]
    async fn test_unknown_platform_rejected() {
        let req = Request::post("/inbound/fax/channel_abc")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = send(app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Unsupported platform: fax");
    }

    #[tokio::test]
    async fn test_agent_reply_requires_token() {
        let req = Request::post("/inbound/agent/chat_abc")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"content":"hi"}"#))
            .unwrap();
        let (status, _) = send(app(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
