//! User management routes.

use std::sync::Arc;

use agenthub_common::{
    error::{HubError, HubResult},
    ids,
    models::{CreateUserRequest, MessageResponse, UpdateUserRequest, User, UserRole},
    validation::validate_request,
};
use agenthub_db::repository::{tokens, users};
use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    middleware,
    routing::get,
};

use crate::{AppState, auth, middleware::AuthContext};

/// User routes.
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/users/me", get(get_me))
        .route("/auth/users", get(list_users).post(create_user))
        .route(
            "/auth/users/{user_id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth_middleware,
        ))
}

/// Members may only look at themselves.
fn ensure_self_or_admin(auth: &AuthContext, user_id: &str) -> HubResult<()> {
    let me = auth.require_user()?;
    if me.is_admin() || me.id == user_id {
        Ok(())
    } else {
        Err(HubError::forbidden("Not enough permissions"))
    }
}

/// GET /auth/users/me — the authenticated user
async fn get_me(Extension(auth): Extension<AuthContext>) -> HubResult<Json<User>> {
    Ok(Json(auth.require_user()?.clone()))
}

/// GET /auth/users — all users (admin)
async fn list_users(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> HubResult<Json<Vec<User>>> {
    auth.require_admin()?;
    Ok(Json(users::list_users(&state.db.pool).await?))
}

/// POST /auth/users — create a user (admin)
async fn create_user(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserRequest>,
) -> HubResult<Json<User>> {
    auth.require_admin()?;
    validate_request(&body)?;

    if users::identity_taken(
        &state.db.pool,
        Some(&body.username),
        body.email.as_deref(),
        body.phone.as_deref(),
        None,
    )
    .await?
    {
        return Err(HubError::AlreadyExists {
            resource: "User with this username, email or phone".into(),
        });
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
        body.role.unwrap_or(UserRole::Member),
    )
    .await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User created");
    Ok(Json(user))
}

/// GET /auth/users/{user_id}
async fn get_user(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> HubResult<Json<User>> {
    ensure_self_or_admin(&auth, &user_id)?;
    let user = users::find_by_id(&state.db.pool, &user_id)
        .await?
        .ok_or_else(|| HubError::not_found("User"))?;
    Ok(Json(user))
}

/// PUT /auth/users/{user_id} — admins edit anyone, members their own profile
async fn update_user(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> HubResult<Json<User>> {
    ensure_self_or_admin(&auth, &user_id)?;
    if body.touches_privileged_fields() && !auth.is_admin() {
        return Err(HubError::forbidden("Only admins can change role or status"));
    }
    validate_request(&body)?;

    if users::find_by_id(&state.db.pool, &user_id).await?.is_none() {
        return Err(HubError::not_found("User"));
    }

    if users::identity_taken(
        &state.db.pool,
        body.username.as_deref(),
        body.email.as_deref(),
        body.phone.as_deref(),
        Some(&user_id),
    )
    .await?
    {
        return Err(HubError::AlreadyExists {
            resource: "User with this username, email or phone".into(),
        });
    }

    let hashed = body
        .password
        .as_deref()
        .map(auth::hash_password)
        .transpose()
        .map_err(|e| HubError::Internal(anyhow::anyhow!("{e}")))?;

    let user = users::update_user(
        &state.db.pool,
        &user_id,
        body.username.as_deref(),
        body.email.as_deref(),
        body.phone.as_deref(),
        hashed.as_deref(),
        body.role,
        body.is_active,
    )
    .await?
    .ok_or_else(|| HubError::not_found("User"))?;

    if body.is_active == Some(false) {
        tokens::revoke_all_for_user(&state.db.pool, &user.id).await?;
    }

    Ok(Json(user))
}

/// DELETE /auth/users/{user_id} — deactivate and revoke all tokens (admin)
async fn delete_user(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> HubResult<Json<MessageResponse>> {
    let admin = auth.require_admin()?;
    if admin.id == user_id {
        return Err(HubError::BadRequest("You cannot delete your own account".into()));
    }

    users::update_user(&state.db.pool, &user_id, None, None, None, None, None, Some(false))
        .await?
        .ok_or_else(|| HubError::not_found("User"))?;
    let revoked = tokens::revoke_all_for_user(&state.db.pool, &user_id).await?;

    tracing::info!(%user_id, revoked, "User deactivated");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{Principal, fixtures};

    #[test]
    fn test_members_only_see_themselves() {
        let member = fixtures::ctx(Principal::User(fixtures::user(UserRole::Member)));
        assert!(ensure_self_or_admin(&member, "user_abc").is_ok());
        assert!(ensure_self_or_admin(&member, "user_other").is_err());

        let admin = fixtures::ctx(Principal::User(fixtures::user(UserRole::Admin)));
        assert!(ensure_self_or_admin(&admin, "user_other").is_ok());

        let agent = fixtures::ctx(Principal::Agent(fixtures::agent()));
        assert!(ensure_self_or_admin(&agent, "user_abc").is_err());
    }
}
