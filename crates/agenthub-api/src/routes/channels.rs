//! Channel routes for messaging-platform accounts and member access.

use std::sync::Arc;

use agenthub_common::{
    error::{HubError, HubResult},
    ids,
    models::{Channel, CreateChannelRequest, MessageResponse, PlatformType, UpdateChannelRequest},
    validation::{validate_name, validate_request},
};
use agenthub_db::repository::{channels, users};
use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    middleware,
    routing::{get, put},
};

use crate::{
    AppState,
    middleware::{AuthContext, Principal, ensure_channel_access},
};

/// Channel routes.
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/channels", get(list_channels).post(create_channel))
        .route(
            "/channels/{channel_id}",
            get(get_channel).put(update_channel).delete(delete_channel),
        )
        .route(
            "/channels/{channel_id}/members/{user_id}",
            put(grant_member).delete(revoke_member),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth_middleware,
        ));

    Router::new()
        .route("/channels/platform-types", get(platform_types))
        .merge(protected)
}

/// GET /channels/platform-types — every supported platform name
async fn platform_types() -> Json<Vec<&'static str>> {
    Json(PlatformType::ALL.iter().map(PlatformType::as_str).collect())
}

/// GET /channels — channels visible to the caller
async fn list_channels(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> HubResult<Json<Vec<Channel>>> {
    let list = match &auth.principal {
        Principal::User(u) if !u.is_admin() => channels::list_for_user(&state.db.pool, &u.id).await?,
        _ => channels::list_all(&state.db.pool).await?,
    };
    Ok(Json(list))
}

/// POST /channels — register a platform account (admin or agent)
async fn create_channel(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateChannelRequest>,
) -> HubResult<Json<Channel>> {
    auth.require_admin_or_agent()?;
    validate_request(&body)?;
    validate_name(&body.name)?;

    let channel = channels::create_channel(
        &state.db.pool,
        &ids::generate(ids::CHANNEL),
        body.name.trim(),
        body.platform,
        &body.credentials_to_send_message,
        body.api_to_send_message.as_deref(),
    )
    .await?;

    tracing::info!(channel_id = %channel.id, platform = %channel.platform, "Channel created");
    Ok(Json(channel))
}

/// GET /channels/{channel_id}
async fn get_channel(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
) -> HubResult<Json<Channel>> {
    Ok(Json(ensure_channel_access(&state, &auth, &channel_id).await?))
}

/// PUT /channels/{channel_id} — partial update (admin or agent)
async fn update_channel(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Json(body): Json<UpdateChannelRequest>,
) -> HubResult<Json<Channel>> {
    auth.require_admin_or_agent()?;
    validate_request(&body)?;
    if let Some(name) = &body.name {
        validate_name(name)?;
    }

    let channel = channels::update_channel(
        &state.db.pool,
        &channel_id,
        body.name.as_deref().map(str::trim),
        body.platform,
        body.credentials_to_send_message.as_ref(),
        body.api_to_send_message.as_deref(),
    )
    .await?
    .ok_or_else(|| HubError::not_found("Channel"))?;

    Ok(Json(channel))
}

/// DELETE /channels/{channel_id} (admin or agent)
async fn delete_channel(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
) -> HubResult<Json<MessageResponse>> {
    auth.require_admin_or_agent()?;
    if !channels::delete_channel(&state.db.pool, &channel_id).await? {
        return Err(HubError::not_found("Channel"));
    }
    tracing::info!(%channel_id, "Channel deleted");
    Ok(Json(MessageResponse::new("Channel deleted successfully")))
}

/// PUT /channels/{channel_id}/members/{user_id} — grant a member access (admin)
async fn grant_member(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((channel_id, user_id)): Path<(String, String)>,
) -> HubResult<Json<MessageResponse>> {
    auth.require_admin()?;
    if !channels::exists(&state.db.pool, &channel_id).await? {
        return Err(HubError::not_found("Channel"));
    }
    if users::find_by_id(&state.db.pool, &user_id).await?.is_none() {
        return Err(HubError::not_found("User"));
    }

    channels::grant_permission(&state.db.pool, &user_id, &channel_id).await?;
    Ok(Json(MessageResponse::new(format!(
        "User {user_id} granted access to channel {channel_id}"
    ))))
}

/// DELETE /channels/{channel_id}/members/{user_id} (admin)
async fn revoke_member(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((channel_id, user_id)): Path<(String, String)>,
) -> HubResult<Json<MessageResponse>> {
    auth.require_admin()?;
    if !channels::revoke_permission(&state.db.pool, &user_id, &channel_id).await? {
        return Err(HubError::NotFoundDetail(
            "User has no access to this channel".into(),
        ));
    }
    Ok(Json(MessageResponse::new(format!(
        "User {user_id} removed from channel {channel_id}"
    ))))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_platform_types_is_public() {
        let (status, body) = get(app(), "/channels/platform-types").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!(["WHATSAPP", "WHATSAPP_TWILIO", "WHAPI", "TELEGRAM", "INSTAGRAM"])
        );
    }

    #[tokio::test]
    async fn test_channel_detail_requires_auth() {
        let (status, _) = get(app(), "/channels/channel_abc").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
