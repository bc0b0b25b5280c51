//! Password hashing and opaque token issuance.
//!
//! Tokens are random strings stored in the `tokens` table; validity is whatever
//! the row says (not revoked, not expired), so revocation takes effect at once.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier},
};
use agenthub_common::config::AuthConfig;
use agenthub_common::ids;
use agenthub_common::models::{LoginResponse, TOKEN_TYPE_BEARER, Token, User};
use agenthub_db::repository::tokens;
use chrono::{DateTime, Duration, Utc};
use password_hash::{SaltString, rand_core::OsRng};
use sqlx::PgPool;

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against an Argon2id hash. A malformed hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Expiry of a login token issued at `now`.
pub fn session_expiry(config: &AuthConfig, now: DateTime<Utc>) -> DateTime<Utc> {
    let ttl = i64::try_from(config.session_ttl_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or_else(|| Duration::days(1));
    now + ttl
}

/// Expiry of an agent API token issued at `now`.
pub fn agent_token_expiry(config: &AuthConfig, now: DateTime<Utc>) -> DateTime<Utc> {
    let ttl = Duration::try_days(config.agent_token_ttl_days).unwrap_or(Duration::days(365));
    now + ttl
}

/// Issue an access + refresh token pair for a user.
pub async fn issue_session(
    pool: &PgPool,
    config: &AuthConfig,
    user: User,
) -> Result<LoginResponse, sqlx::Error> {
    let access = ids::access_token();
    let refresh = ids::refresh_token();
    let token = tokens::create_user_token(
        pool,
        &ids::generate(ids::TOKEN),
        &access,
        Some(&refresh),
        session_expiry(config, Utc::now()),
        &user.id,
    )
    .await?;

    Ok(LoginResponse {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        token_type: TOKEN_TYPE_BEARER.into(),
        expires_at: token.expires_at,
        user,
    })
}

/// Issue a new API token for an agent.
pub async fn issue_agent_token(
    pool: &PgPool,
    config: &AuthConfig,
    agent_id: &str,
) -> Result<Token, sqlx::Error> {
    tokens::create_agent_token(
        pool,
        &ids::generate(ids::TOKEN),
        &ids::access_token(),
        agent_token_expiry(config, Utc::now()),
        agent_id,
    )
    .await
}
