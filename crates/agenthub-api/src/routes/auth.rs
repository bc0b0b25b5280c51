//! Authentication routes: first-run signup, login, refresh, logout.

use std::sync::Arc;

use agenthub_common::{
    error::{HubError, HubResult},
    ids,
    models::{
        CreateUserRequest, HasUsersResponse, LoginRequest, LoginResponse, MessageResponse,
        RefreshRequest, UserRole,
    },
    validation::validate_request,
};
use agenthub_db::repository::{tokens, users};
use axum::{
    Json, Router,
    extract::{Extension, State},
    middleware,
    routing::{get, post},
};

use crate::{AppState, auth, middleware::AuthContext};

/// Auth router.
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/auth/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth_middleware,
        ));

    Router::new()
        .route("/auth/has-users", get(has_users))
        .route("/auth/signup", post(signup))
        .route("/auth/token", post(login))
        .route("/auth/refresh", post(refresh))
        .merge(protected)
}

/// GET /auth/has-users — whether first-run signup is still open
async fn has_users(State(state): State<Arc<AppState>>) -> HubResult<Json<HasUsersResponse>> {
    let count = users::count_users(&state.db.pool).await?;
    Ok(Json(HasUsersResponse {
        has_users: count > 0,
    }))
}

/// POST /auth/signup — create the first admin account
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserRequest>,
) -> HubResult<Json<LoginResponse>> {
    validate_request(&body)?;

    if users::count_users(&state.db.pool).await? > 0 {
        return Err(HubError::forbidden(
            "Signup is disabled once a user exists; ask an admin for an account",
        ));
    }

    let hashed = auth::hash_password(&body.password)
        .map_err(|e| HubError::Internal(anyhow::anyhow!("{e}")))?;
    let user = users::create_user(
        &state.db.pool,
        &ids::generate(ids::USER),
        &body.username,
        body.email.as_deref(),
        body.phone.as_deref(),
        &hashed,
        UserRole::Admin,
    )
    .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "First admin created");

    let session = auth::issue_session(&state.db.pool, &state.config.auth, user).await?;
    Ok(Json(session))
}

/// POST /auth/token — username + password login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> HubResult<Json<LoginResponse>> {
    let user = users::find_by_username(&state.db.pool, &body.username)
        .await?
        .filter(|u| u.is_active)
        .ok_or(HubError::InvalidCredentials)?;

    if !auth::verify_password(&body.password, &user.hashed_password) {
        return Err(HubError::InvalidCredentials);
    }

    tracing::info!(user_id = %user.id, "User logged in");

    let session = auth::issue_session(&state.db.pool, &state.config.auth, user).await?;
    Ok(Json(session))
}

/// POST /auth/refresh — trade a refresh token for a new token pair
async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> HubResult<Json<LoginResponse>> {
    let owned = tokens::find_active_by_refresh_token(&state.db.pool, &body.refresh_token)
        .await?
        .ok_or(HubError::InvalidToken)?;
    let user_id = owned.user_id.ok_or(HubError::InvalidToken)?;

    let user = users::find_by_id(&state.db.pool, &user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(HubError::InvalidToken)?;

    tokens::revoke(&state.db.pool, &owned.token.id).await?;
    let session = auth::issue_session(&state.db.pool, &state.config.auth, user).await?;
    Ok(Json(session))
}

/// POST /auth/logout — revoke the presenting token
async fn logout(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> HubResult<Json<MessageResponse>> {
    tokens::revoke(&state.db.pool, &auth.token_id).await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};

    #[tokio::test]
    async fn test_logout_requires_token() {
        let req = Request::post("/auth/logout").body(Body::empty()).unwrap();
        let (status, _) = send(app(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_signup_rejects_invalid_body_before_touching_db() {
        let req = Request::post("/auth/signup")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"username":"x","password":"123"}"#))
            .unwrap();
        let (status, body) = send(app(), req).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}
