//! Conversations inside a channel, their messages, notes and documents.

use std::sync::Arc;

use agenthub_common::{
    error::{HubError, HubResult},
    ids,
    models::{
        AssignChatRequest, AttachDocumentRequest, Channel, Chat, ChatList, ChatListQuery,
        CreateNoteRequest, Document, MarkReadResponse, Message, MessageList, Note, Pagination,
        SendMessageRequest, SenderType,
    },
    validation::validate_request,
};
use agenthub_db::repository::{
    chats,
    documents::{self, DocumentOwner},
    messages,
    notes::{self, NoteOwner},
    users,
};
use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    middleware,
    routing::{get, post},
};
use serde_json::json;

use crate::{
    AppState,
    middleware::{AuthContext, Principal, ensure_channel_access},
    routes::resolve_mime_type,
};

/// Chat routes.
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/channels/{channel_id}/chats", get(list_chats))
        .route("/channels/{channel_id}/chats/{chat_id}", get(get_chat))
        .route("/channels/{channel_id}/chats/{chat_id}/assign", post(assign_chat))
        .route(
            "/channels/{channel_id}/chats/{chat_id}/messages",
            get(list_messages).post(send_message),
        )
        .route("/channels/{channel_id}/chats/{chat_id}/read", post(mark_read))
        .route(
            "/channels/{channel_id}/chats/{chat_id}/notes",
            get(list_notes).post(add_note),
        )
        .route(
            "/channels/{channel_id}/chats/{chat_id}/documents",
            get(list_documents).post(attach_document),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth_middleware,
        ))
}

/// Load a chat through its channel, enforcing channel access.
pub(crate) async fn load_chat(
    state: &AppState,
    auth: &AuthContext,
    channel_id: &str,
    chat_id: &str,
) -> HubResult<(Channel, Chat)> {
    let channel = ensure_channel_access(state, auth, channel_id).await?;
    let chat = chats::find_in_channel(&state.db.pool, channel_id, chat_id)
        .await?
        .ok_or_else(|| HubError::NotFoundDetail("Chat not found in this channel".into()))?;
    Ok((channel, chat))
}

/// Store a message written by the caller, deliver it to the platform and, for
/// agent authors, notify connected operators.
pub(crate) async fn post_chat_message(
    state: &AppState,
    auth: &AuthContext,
    chat: &Chat,
    body: SendMessageRequest,
) -> HubResult<Message> {
    let sender_type = auth.sender_type();
    let mut meta = match body.meta_data {
        Some(serde_json::Value::Object(map)) => serde_json::Value::Object(map),
        _ => json!({}),
    };
    if let Some(obj) = meta.as_object_mut() {
        match &auth.principal {
            Principal::User(u) => obj.insert("user_id".into(), json!(u.id)),
            Principal::Agent(a) => obj.insert("agent_id".into(), json!(a.id)),
        };
    }

    let message = state
        .delivery
        .post_reply(chat, sender_type, &body.content, meta, sender_type == SenderType::Agent)
        .await?;

    tracing::info!(
        chat_id = %chat.id,
        message_id = %message.id,
        sender_type = sender_type.as_str(),
        delivery_status = ?message.delivery_status,
        "Message sent"
    );
    Ok(message)
}

/// GET /channels/{channel_id}/chats — newest activity first
async fn list_chats(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Query(query): Query<ChatListQuery>,
) -> HubResult<Json<ChatList>> {
    ensure_channel_access(&state, &auth, &channel_id).await?;
    let page = Pagination {
        limit: query.limit,
        offset: query.offset,
    }
    .clamped();

    let (list, total_count) = chats::list_for_channel(
        &state.db.pool,
        &channel_id,
        query.assigned_user_id.as_deref(),
        query.assigned,
        page.limit,
        page.offset,
    )
    .await?;

    Ok(Json(ChatList {
        chats: list,
        total_count,
        has_more: page.has_more(total_count),
    }))
}

/// GET /channels/{channel_id}/chats/{chat_id}
async fn get_chat(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((channel_id, chat_id)): Path<(String, String)>,
) -> HubResult<Json<Chat>> {
    let (_, chat) = load_chat(&state, &auth, &channel_id, &chat_id).await?;
    Ok(Json(chat))
}

/// POST /channels/{channel_id}/chats/{chat_id}/assign — `{user_id: null}` unassigns
async fn assign_chat(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((channel_id, chat_id)): Path<(String, String)>,
    Json(body): Json<AssignChatRequest>,
) -> HubResult<Json<Chat>> {
    load_chat(&state, &auth, &channel_id, &chat_id).await?;

    if let Some(user_id) = body.user_id.as_deref() {
        if users::find_by_id(&state.db.pool, user_id).await?.is_none() {
            return Err(HubError::not_found("User"));
        }
    }

    let chat = chats::assign(&state.db.pool, &chat_id, body.user_id.as_deref())
        .await?
        .ok_or_else(|| HubError::not_found("Chat"))?;
    tracing::info!(%chat_id, assigned_user_id = ?chat.assigned_user_id, "Chat assignment changed");
    Ok(Json(chat))
}

/// GET /channels/{channel_id}/chats/{chat_id}/messages — newest first
async fn list_messages(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((channel_id, chat_id)): Path<(String, String)>,
    Query(page): Query<Pagination>,
) -> HubResult<Json<MessageList>> {
    load_chat(&state, &auth, &channel_id, &chat_id).await?;
    let page = page.clamped();

    let (list, total_count) =
        messages::list_for_chat(&state.db.pool, &chat_id, page.limit, page.offset).await?;
    Ok(Json(MessageList {
        messages: list,
        total_count,
        has_more: page.has_more(total_count),
    }))
}

/// POST /channels/{channel_id}/chats/{chat_id}/messages
async fn send_message(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((channel_id, chat_id)): Path<(String, String)>,
    Json(body): Json<SendMessageRequest>,
) -> HubResult<Json<Message>> {
    validate_request(&body)?;
    if body.content.trim().is_empty() {
        return Err(HubError::Validation {
            message: "Content cannot be blank".into(),
        });
    }
    let (_, chat) = load_chat(&state, &auth, &channel_id, &chat_id).await?;
    Ok(Json(post_chat_message(&state, &auth, &chat, body).await?))
}

/// POST /channels/{channel_id}/chats/{chat_id}/read — mark contact messages read
async fn mark_read(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((channel_id, chat_id)): Path<(String, String)>,
) -> HubResult<Json<MarkReadResponse>> {
    load_chat(&state, &auth, &channel_id, &chat_id).await?;
    let updated = messages::mark_read(&state.db.pool, &chat_id).await?;
    Ok(Json(MarkReadResponse { updated }))
}

/// GET /channels/{channel_id}/chats/{chat_id}/notes
async fn list_notes(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((channel_id, chat_id)): Path<(String, String)>,
) -> HubResult<Json<Vec<Note>>> {
    load_chat(&state, &auth, &channel_id, &chat_id).await?;
    Ok(Json(notes::list_notes(&state.db.pool, NoteOwner::Chat, &chat_id).await?))
}

/// POST /channels/{channel_id}/chats/{chat_id}/notes
async fn add_note(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((channel_id, chat_id)): Path<(String, String)>,
    Json(body): Json<CreateNoteRequest>,
) -> HubResult<Json<Note>> {
    validate_request(&body)?;
    load_chat(&state, &auth, &channel_id, &chat_id).await?;

    let note = notes::create_note(
        &state.db.pool,
        NoteOwner::Chat,
        &chat_id,
        &ids::generate(ids::NOTE),
        &body.content,
        auth.user_id(),
    )
    .await?;
    Ok(Json(note))
}

/// GET /channels/{channel_id}/chats/{chat_id}/documents
async fn list_documents(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((channel_id, chat_id)): Path<(String, String)>,
) -> HubResult<Json<Vec<Document>>> {
    load_chat(&state, &auth, &channel_id, &chat_id).await?;
    Ok(Json(
        documents::list_documents(&state.db.pool, DocumentOwner::Chat, &chat_id).await?,
    ))
}

/// POST /channels/{channel_id}/chats/{chat_id}/documents
async fn attach_document(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((channel_id, chat_id)): Path<(String, String)>,
    Json(body): Json<AttachDocumentRequest>,
) -> HubResult<Json<Document>> {
    validate_request(&body)?;
    load_chat(&state, &auth, &channel_id, &chat_id).await?;

    let mime_type = resolve_mime_type(body.mime_type.as_deref(), &body.file_name);
    let document = documents::attach_document(
        &state.db.pool,
        DocumentOwner::Chat,
        &chat_id,
        &ids::generate(ids::DOCUMENT),
        &body.file_url,
        &body.file_name,
        &mime_type,
        auth.user_id(),
    )
    .await?;
    Ok(Json(document))
}
