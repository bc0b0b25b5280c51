//! Token repository: bearer credentials for users and agents.
//!
//! Only tokens with `is_revoked = FALSE AND expires_at > NOW()` ever authenticate
//! or show up in listings. Revocation is an idempotent `UPDATE`.

use agenthub_common::models::{TOKEN_TYPE_BEARER, Token};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// A live token together with whoever owns it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OwnedToken {
    #[sqlx(flatten)]
    pub token: Token,
    pub user_id: Option<String>,
    pub agent_id: Option<String>,
}

const ACTIVE: &str = "t.is_revoked = FALSE AND t.expires_at > NOW()";

/// Insert a login token and link it to the user.
pub async fn create_user_token(
    pool: &PgPool,
    id: &str,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_at: DateTime<Utc>,
    user_id: &str,
) -> Result<Token, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let token = insert_token(&mut tx, id, access_token, refresh_token, expires_at).await?;
    sqlx::query("INSERT INTO token_users (token_id, user_id) VALUES ($1, $2)")
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(token)
}

/// Insert an agent API token and link it to the agent.
pub async fn create_agent_token(
    pool: &PgPool,
    id: &str,
    access_token: &str,
    expires_at: DateTime<Utc>,
    agent_id: &str,
) -> Result<Token, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let token = insert_token(&mut tx, id, access_token, None, expires_at).await?;
    sqlx::query("INSERT INTO token_agents (token_id, agent_id) VALUES ($1, $2)")
        .bind(id)
        .bind(agent_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(token)
}

async fn insert_token(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: &str,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_at: DateTime<Utc>,
) -> Result<Token, sqlx::Error> {
    sqlx::query_as::<_, Token>(
        r#"
        INSERT INTO tokens (id, token_type, access_token, refresh_token, expires_at, created_at, is_revoked)
        VALUES ($1, $2, $3, $4, $5, NOW(), FALSE)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(TOKEN_TYPE_BEARER)
    .bind(access_token)
    .bind(refresh_token)
    .bind(expires_at)
    .fetch_one(&mut **tx)
    .await
}

/// Resolve a presented access token to its live row and owner.
pub async fn find_active_by_access_token(
    pool: &PgPool,
    access_token: &str,
) -> Result<Option<OwnedToken>, sqlx::Error> {
    sqlx::query_as::<_, OwnedToken>(&format!(
        r#"
        SELECT t.*, tu.user_id, ta.agent_id
        FROM tokens t
        LEFT JOIN token_users tu ON tu.token_id = t.id
        LEFT JOIN token_agents ta ON ta.token_id = t.id
        WHERE t.access_token = $1 AND {ACTIVE}
        "#
    ))
    .bind(access_token)
    .fetch_optional(pool)
    .await
}

/// Resolve a refresh token to its live row and owner.
pub async fn find_active_by_refresh_token(
    pool: &PgPool,
    refresh_token: &str,
) -> Result<Option<OwnedToken>, sqlx::Error> {
    sqlx::query_as::<_, OwnedToken>(&format!(
        r#"
        SELECT t.*, tu.user_id, ta.agent_id
        FROM tokens t
        LEFT JOIN token_users tu ON tu.token_id = t.id
        LEFT JOIN token_agents ta ON ta.token_id = t.id
        WHERE t.refresh_token = $1 AND {ACTIVE}
        "#
    ))
    .bind(refresh_token)
    .fetch_optional(pool)
    .await
}

/// Active tokens of an agent, newest first.
pub async fn list_active_agent_tokens(
    pool: &PgPool,
    agent_id: &str,
) -> Result<Vec<Token>, sqlx::Error> {
    sqlx::query_as::<_, Token>(&format!(
        r#"
        SELECT t.* FROM tokens t
        JOIN token_agents ta ON ta.token_id = t.id
        WHERE ta.agent_id = $1 AND {ACTIVE}
        ORDER BY t.created_at DESC
        "#
    ))
    .bind(agent_id)
    .fetch_all(pool)
    .await
}

/// A token owned by the given agent, whatever its state.
pub async fn find_agent_token(
    pool: &PgPool,
    agent_id: &str,
    token_id: &str,
) -> Result<Option<Token>, sqlx::Error> {
    sqlx::query_as::<_, Token>(
        r#"
        SELECT t.* FROM tokens t
        JOIN token_agents ta ON ta.token_id = t.id
        WHERE ta.agent_id = $1 AND t.id = $2
        "#,
    )
    .bind(agent_id)
    .bind(token_id)
    .fetch_optional(pool)
    .await
}

/// Mark a token revoked. Revoking twice is harmless.
pub async fn revoke(pool: &PgPool, token_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE tokens SET is_revoked = TRUE WHERE id = $1")
        .bind(token_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn revoke_all_for_user(pool: &PgPool, user_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE tokens SET is_revoked = TRUE
        WHERE is_revoked = FALSE
          AND id IN (SELECT token_id FROM token_users WHERE user_id = $1)
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn revoke_all_for_agent(pool: &PgPool, agent_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE tokens SET is_revoked = TRUE
        WHERE is_revoked = FALSE
          AND id IN (SELECT token_id FROM token_agents WHERE agent_id = $1)
        "#,
    )
    .bind(agent_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
