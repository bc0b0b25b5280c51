//! Which agents listen on a chat.

use std::sync::Arc;

use agenthub_common::{
    error::{HubError, HubResult},
    models::{ChatAgentDetail, ChatAgentList, ChatAgentListQuery, Pagination, UpdateChatAgentRequest},
};
use agenthub_db::repository::chat_agents;
use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    middleware,
    routing::get,
};

use crate::{AppState, middleware::AuthContext, routes::chats::load_chat};

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/channels/{channel_id}/chats/{chat_id}/agents",
            get(list_chat_agents),
        )
        .route(
            "/channels/{channel_id}/chats/{chat_id}/agents/{agent_id}",
            get(get_chat_agent).put(update_chat_agent),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth_middleware,
        ))
}

fn not_assigned() -> HubError {
    HubError::NotFoundDetail("Agent not assigned to this chat".into())
}

/// GET /channels/{channel_id}/chats/{chat_id}/agents — ordered by agent name
async fn list_chat_agents(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((channel_id, chat_id)): Path<(String, String)>,
    Query(query): Query<ChatAgentListQuery>,
) -> HubResult<Json<ChatAgentList>> {
    load_chat(&state, &auth, &channel_id, &chat_id).await?;
    let page = Pagination {
        limit: query.limit,
        offset: query.offset,
    }
    .clamped();

    let (list, total_count) =
        chat_agents::list_details(&state.db.pool, &chat_id, query.active, page.limit, page.offset)
            .await?;
    Ok(Json(ChatAgentList {
        chat_agents: list,
        total_count,
        has_more: page.has_more(total_count),
    }))
}

/// GET /channels/{channel_id}/chats/{chat_id}/agents/{agent_id}
async fn get_chat_agent(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((channel_id, chat_id, agent_id)): Path<(String, String, String)>,
) -> HubResult<Json<ChatAgentDetail>> {
    load_chat(&state, &auth, &channel_id, &chat_id).await?;
    let detail = chat_agents::find_detail(&state.db.pool, &chat_id, &agent_id)
        .await?
        .ok_or_else(not_assigned)?;
    Ok(Json(detail))
}

/// PUT /channels/{channel_id}/chats/{chat_id}/agents/{agent_id} — toggle `active`
async fn update_chat_agent(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((channel_id, chat_id, agent_id)): Path<(String, String, String)>,
    Json(body): Json<UpdateChatAgentRequest>,
) -> HubResult<Json<ChatAgentDetail>> {
    load_chat(&state, &auth, &channel_id, &chat_id).await?;

    if !chat_agents::set_active(&state.db.pool, &chat_id, &agent_id, body.active).await? {
        return Err(not_assigned());
    }
    tracing::info!(%chat_id, %agent_id, active = body.active, "Chat agent updated");

    let detail = chat_agents::find_detail(&state.db.pool, &chat_id, &agent_id)
        .await?
        .ok_or_else(not_assigned)?;
    Ok(Json(detail))
}
