//! Agent routes. Agents are external AI services reached through webhooks.

use std::sync::Arc;

use agenthub_common::{
    error::{HubError, HubResult},
    ids,
    models::{Agent, AgentListQuery, CreateAgentRequest, DeleteQuery, MessageResponse, UpdateAgentRequest},
    validation::{validate_name, validate_request},
};
use agenthub_db::repository::{agents, channels};
use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    middleware,
    routing::get,
};

use crate::{AppState, middleware::AuthContext};

/// Agent routes.
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/agents", get(list_agents).post(create_agent))
        .route(
            "/auth/agents/{agent_id}",
            get(get_agent).put(update_agent).delete(delete_agent),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth_middleware,
        ))
}

async fn ensure_channel_exists(state: &AppState, channel_id: Option<&str>) -> HubResult<()> {
    if let Some(channel_id) = channel_id {
        if !channels::exists(&state.db.pool, channel_id).await? {
            return Err(HubError::not_found("Channel"));
        }
    }
    Ok(())
}

/// POST /auth/agents — register an agent (admin)
async fn create_agent(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateAgentRequest>,
) -> HubResult<Json<Agent>> {
    auth.require_admin()?;
    validate_request(&body)?;
    validate_name(&body.name)?;
    ensure_channel_exists(&state, body.channel_id.as_deref()).await?;

    let agent = agents::create_agent(
        &state.db.pool,
        &ids::generate(ids::AGENT),
        body.name.trim(),
        body.webhook_url.as_deref(),
        body.is_fire_and_forget,
        body.buffer_time_seconds,
        body.history_msg_count,
        body.recent_msg_window_minutes,
        body.activate_for_new_conversation,
    )
    .await?;

    tracing::info!(agent_id = %agent.id, name = %agent.name, "Agent created");
    Ok(Json(agent))
}

/// GET /auth/agents?active=true
async fn list_agents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AgentListQuery>,
) -> HubResult<Json<Vec<Agent>>> {
    Ok(Json(agents::list_agents(&state.db.pool, query.active).await?))
}

/// GET /auth/agents/{agent_id}
async fn get_agent(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> HubResult<Json<Agent>> {
    let agent = agents::find_by_id(&state.db.pool, &agent_id)
        .await?
        .ok_or_else(|| HubError::not_found("Agent"))?;
    Ok(Json(agent))
}

/// PUT /auth/agents/{agent_id} — partial update (admin)
async fn update_agent(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    Json(body): Json<UpdateAgentRequest>,
) -> HubResult<Json<Agent>> {
    auth.require_admin()?;
    validate_request(&body)?;
    if let Some(name) = &body.name {
        validate_name(name)?;
    }
    ensure_channel_exists(&state, body.channel_id.as_deref()).await?;

    let agent = agents::update_agent(
        &state.db.pool,
        &agent_id,
        body.name.as_deref().map(str::trim),
        body.webhook_url.as_deref(),
        body.is_active,
        body.is_fire_and_forget,
        body.buffer_time_seconds,
        body.history_msg_count,
        body.recent_msg_window_minutes,
        body.activate_for_new_conversation,
    )
    .await?
    .ok_or_else(|| HubError::not_found("Agent"))?;

    Ok(Json(agent))
}

/// DELETE /auth/agents/{agent_id}?hard=false (admin)
async fn delete_agent(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> HubResult<Json<MessageResponse>> {
    auth.require_admin()?;
    if agents::find_by_id(&state.db.pool, &agent_id).await?.is_none() {
        return Err(HubError::not_found("Agent"));
    }

    if query.hard {
        agents::delete_agent(&state.db.pool, &agent_id).await?;
        tracing::info!(%agent_id, "Agent deleted");
        Ok(Json(MessageResponse::new("Agent deleted successfully")))
    } else {
        agents::deactivate(&state.db.pool, &agent_id).await?;
        tracing::info!(%agent_id, "Agent soft-deleted");
        Ok(Json(MessageResponse::new("Agent soft-deleted successfully")))
    }
}
