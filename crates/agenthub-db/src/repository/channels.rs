//! Channel repository, including member permissions.

use agenthub_common::models::{Channel, PlatformType};
use sqlx::PgPool;

pub async fn create_channel(
    pool: &PgPool,
    id: &str,
    name: &str,
    platform: PlatformType,
    credentials: &serde_json::Value,
    api_to_send_message: Option<&str>,
) -> Result<Channel, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        r#"
        INSERT INTO channels (id, name, platform, credentials_to_send_message, api_to_send_message, created_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(platform)
    .bind(credentials)
    .bind(api_to_send_message)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn exists(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM channels WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>("SELECT * FROM channels ORDER BY created_at ASC")
        .fetch_all(pool)
        .await
}

/// Channels a member has been granted.
pub async fn list_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        r#"
        SELECT c.* FROM channels c
        JOIN user_channel_permissions p ON p.channel_id = c.id
        WHERE p.user_id = $1
        ORDER BY c.created_at ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn update_channel(
    pool: &PgPool,
    id: &str,
    name: Option<&str>,
    platform: Option<PlatformType>,
    credentials: Option<&serde_json::Value>,
    api_to_send_message: Option<&str>,
) -> Result<Option<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        r#"
        UPDATE channels SET
            name = COALESCE($2, name),
            platform = COALESCE($3, platform),
            credentials_to_send_message = COALESCE($4, credentials_to_send_message),
            api_to_send_message = COALESCE($5, api_to_send_message)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(platform)
    .bind(credentials)
    .bind(api_to_send_message)
    .fetch_optional(pool)
    .await
}

/// Delete a channel together with its member permissions. Returns false if it did not exist.
pub async fn delete_channel(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM user_channel_permissions WHERE channel_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM channels WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

pub async fn has_permission(pool: &PgPool, user_id: &str, channel_id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM user_channel_permissions WHERE user_id = $1 AND channel_id = $2)",
    )
    .bind(user_id)
    .bind(channel_id)
    .fetch_one(pool)
    .await
}

pub async fn grant_permission(pool: &PgPool, user_id: &str, channel_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_channel_permissions (user_id, channel_id) VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(channel_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn revoke_permission(pool: &PgPool, user_id: &str, channel_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user_channel_permissions WHERE user_id = $1 AND channel_id = $2")
        .bind(user_id)
        .bind(channel_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
