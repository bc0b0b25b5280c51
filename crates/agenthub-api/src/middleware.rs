//! Middleware: bearer authentication, role checks, security headers.

use std::sync::Arc;

use agenthub_common::error::{HubError, HubResult};
use agenthub_common::models::{Agent, Channel, SenderType, User};
use agenthub_db::repository::{agents, channels, tokens, users};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::AppState;

/// Who is behind a bearer token.
#[derive(Debug, Clone)]
pub enum Principal {
    User(User),
    Agent(Agent),
}

/// Authentication context extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Row ID of the presented token (used by logout).
    pub token_id: String,
    pub principal: Principal,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        matches!(&self.principal, Principal::User(u) if u.is_admin())
    }

    pub fn is_agent(&self) -> bool {
        matches!(self.principal, Principal::Agent(_))
    }

    pub fn user(&self) -> Option<&User> {
        match &self.principal {
            Principal::User(u) => Some(u),
            Principal::Agent(_) => None,
        }
    }

    pub fn agent(&self) -> Option<&Agent> {
        match &self.principal {
            Principal::Agent(a) => Some(a),
            Principal::User(_) => None,
        }
    }

    /// User ID recorded as author of notes and documents; `None` for agents.
    pub fn user_id(&self) -> Option<&str> {
        self.user().map(|u| u.id.as_str())
    }

    pub fn sender_type(&self) -> SenderType {
        if self.is_agent() {
            SenderType::Agent
        } else {
            SenderType::User
        }
    }

    pub fn require_admin(&self) -> HubResult<&User> {
        match &self.principal {
            Principal::User(u) if u.is_admin() => Ok(u),
            _ => Err(HubError::AdminRequired),
        }
    }

    pub fn require_admin_or_agent(&self) -> HubResult<()> {
        if self.is_admin() || self.is_agent() {
            Ok(())
        } else {
            Err(HubError::AdminOrAgentRequired)
        }
    }

    /// Endpoints that only make sense for a human operator.
    pub fn require_user(&self) -> HubResult<&User> {
        self.user()
            .ok_or_else(|| HubError::forbidden("User access required"))
    }
}

/// Extract `<token>` from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the bearer token to a live user or agent.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, HubError> {
    let token = bearer_token(request.headers()).ok_or(HubError::Unauthorized)?;

    let owned = tokens::find_active_by_access_token(&state.db.pool, token)
        .await?
        .ok_or(HubError::InvalidToken)?;

    let principal = match (owned.user_id.as_deref(), owned.agent_id.as_deref()) {
        (Some(user_id), _) => {
            let user = users::find_by_id(&state.db.pool, user_id)
                .await?
                .filter(|u| u.is_active)
                .ok_or(HubError::Unauthorized)?;
            Principal::User(user)
        }
        (None, Some(agent_id)) => {
            let agent = agents::find_by_id(&state.db.pool, agent_id)
                .await?
                .filter(|a| a.is_active)
                .ok_or(HubError::Unauthorized)?;
            Principal::Agent(agent)
        }
        (None, None) => return Err(HubError::InvalidToken),
    };

    request.extensions_mut().insert(AuthContext {
        token_id: owned.token.id,
        principal,
    });

    Ok(next.run(request).await)
}

/// Load a channel the caller may see. Admins and agents see every channel,
/// members only those they were granted.
pub async fn ensure_channel_access(
    state: &AppState,
    auth: &AuthContext,
    channel_id: &str,
) -> HubResult<Channel> {
    let channel = channels::find_by_id(&state.db.pool, channel_id)
        .await?
        .ok_or_else(|| HubError::not_found("Channel"))?;

    match &auth.principal {
        Principal::Agent(_) => Ok(channel),
        Principal::User(u) if u.is_admin() => Ok(channel),
        Principal::User(u) => {
            if channels::has_permission(&state.db.pool, &u.id, channel_id).await? {
                Ok(channel)
            } else {
                Err(HubError::forbidden("Not enough permissions for this channel"))
            }
        }
    }
}

// ── Security headers ──────────────────────────────────────────────────────────

/// Add security headers to every HTTP response.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let h = response.headers_mut();

    macro_rules! set {
        ($name:expr, $val:expr) => {
            if let Ok(v) = $val.parse::<axum::http::HeaderValue>() {
                h.insert(axum::http::header::HeaderName::from_static($name), v);
            }
        };
    }

    set!("x-content-type-options", "nosniff");
    set!("x-frame-options", "DENY");
    set!("referrer-policy", "strict-origin-when-cross-origin");
    set!("strict-transport-security", "max-age=63072000; includeSubDomains");

    response
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use agenthub_common::models::UserRole;
    use chrono::Utc;

    pub fn user(role: UserRole) -> User {
        User {
            id: "user_abc".into(),
            username: "jane".into(),
            email: None,
            phone: None,
            hashed_password: String::new(),
            role,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn agent() -> Agent {
        Agent {
            id: "agent_abc".into(),
            name: "Support bot".into(),
            webhook_url: None,
            is_active: true,
            is_fire_and_forget: false,
            buffer_time_seconds: 3,
            history_msg_count: 40,
            recent_msg_window_minutes: 1440,
            activate_for_new_conversation: true,
            created_at: Utc::now(),
        }
    }

    pub fn ctx(principal: Principal) -> AuthContext {
        AuthContext {
            token_id: "token_abc".into(),
            principal,
        }
    }
}
