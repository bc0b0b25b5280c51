//! Bearer credentials.
//!
//! A token row is owned by exactly one user or one agent, linked through the
//! `token_users` / `token_agents` junction tables. Tokens are never deleted by
//! the API: revocation flips `is_revoked`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::User;

pub const TOKEN_TYPE_BEARER: &str = "bearer";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Token {
    pub id: String,
    pub token_type: String,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub is_revoked: bool,
}

/// Agent token as returned by the token-management endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTokenResponse {
    pub id: String,
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Token> for AgentTokenResponse {
    fn from(token: Token) -> Self {
        Self {
            id: token.id,
            access_token: token.access_token,
            token_type: token.token_type,
            expires_at: token.expires_at,
            created_at: token.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AgentTokenList {
    pub tokens: Vec<AgentTokenResponse>,
}

/// Returned by login, signup and refresh.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Token {
        let now = Utc::now();
        Token {
            id: "token_abc".into(),
            token_type: TOKEN_TYPE_BEARER.into(),
            access_token: "tkn_x".into(),
            refresh_token: None,
            expires_at: now + chrono::Duration::days(1),
            created_at: now,
            is_revoked: false,
        }
    }

    #[test]
    fn test_response_hides_revocation_state() {
        let json = serde_json::to_value(AgentTokenResponse::from(token())).unwrap();
        assert!(json.get("is_revoked").is_none());
        assert_eq!(json["token_type"], "bearer");
    }
}
