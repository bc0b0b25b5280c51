//! Agent token management (admin only).
//!
//! Agents authenticate with long-lived opaque bearer tokens. Listing only shows
//! live tokens; revocation is a soft delete and repeating it is harmless.

use std::sync::Arc;

use agenthub_common::{
    error::{HubError, HubResult},
    models::{AgentTokenList, AgentTokenResponse, MessageResponse},
};
use agenthub_db::repository::{agents, tokens};
use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    middleware,
    routing::{delete, get},
};

use crate::{AppState, auth, middleware::AuthContext};

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/auth/agents/{agent_id}/tokens",
            get(list_tokens).post(create_token),
        )
        .route(
            "/auth/agents/{agent_id}/tokens/{token_id}",
            delete(revoke_token),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth_middleware,
        ))
}

async fn ensure_agent(state: &AppState, agent_id: &str) -> HubResult<()> {
    agents::find_by_id(&state.db.pool, agent_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| HubError::not_found("Agent"))
}

/// GET /auth/agents/{agent_id}/tokens — live tokens of an agent
async fn list_tokens(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> HubResult<Json<AgentTokenList>> {
    auth.require_admin()?;
    ensure_agent(&state, &agent_id).await?;

    let live = tokens::list_active_agent_tokens(&state.db.pool, &agent_id).await?;
    Ok(Json(AgentTokenList {
        tokens: live.into_iter().map(AgentTokenResponse::from).collect(),
    }))
}

/// POST /auth/agents/{agent_id}/tokens — issue a new token
async fn create_token(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> HubResult<Json<AgentTokenResponse>> {
    auth.require_admin()?;
    ensure_agent(&state, &agent_id).await?;

    let token = auth::issue_agent_token(&state.db.pool, &state.config.auth, &agent_id).await?;
    tracing::info!(%agent_id, token_id = %token.id, expires_at = %token.expires_at, "Agent token issued");
    Ok(Json(token.into()))
}

/// DELETE /auth/agents/{agent_id}/tokens/{token_id} — soft-revoke
async fn revoke_token(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((agent_id, token_id)): Path<(String, String)>,
) -> HubResult<Json<MessageResponse>> {
    auth.require_admin()?;
    ensure_agent(&state, &agent_id).await?;

    tokens::find_agent_token(&state.db.pool, &agent_id, &token_id)
        .await?
        .ok_or_else(|| {
            HubError::NotFoundDetail("Token not found or does not belong to this agent".into())
        })?;

    tokens::revoke(&state.db.pool, &token_id).await?;
    tracing::info!(%agent_id, %token_id, "Agent token revoked");
    Ok(Json(MessageResponse::new(format!(
        "Token {token_id} revoked successfully"
    ))))
}
