//! Chat repository.

use agenthub_common::models::{Chat, SenderType};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Chat>, sqlx::Error> {
    sqlx::query_as::<_, Chat>("SELECT * FROM chats WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// A chat, but only if it belongs to the given channel.
pub async fn find_in_channel(
    pool: &PgPool,
    channel_id: &str,
    chat_id: &str,
) -> Result<Option<Chat>, sqlx::Error> {
    sqlx::query_as::<_, Chat>("SELECT * FROM chats WHERE id = $1 AND channel_id = $2")
        .bind(chat_id)
        .bind(channel_id)
        .fetch_optional(pool)
        .await
}

/// Fetch the chat for `(channel_id, external_id)`, creating it when missing.
///
/// Returns the chat and whether this call created it.
pub async fn get_or_create(
    pool: &PgPool,
    id: &str,
    channel_id: &str,
    external_id: &str,
    name: &str,
    meta_data: &serde_json::Value,
) -> Result<(Chat, bool), sqlx::Error> {
    let inserted = sqlx::query_as::<_, Chat>(
        r#"
        INSERT INTO chats (id, name, external_id, channel_id, last_message_ts, meta_data, extra_data, created_at)
        VALUES ($1, $2, $3, $4, NOW(), $5, '{}'::jsonb, NOW())
        ON CONFLICT (channel_id, external_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(external_id)
    .bind(channel_id)
    .bind(meta_data)
    .fetch_optional(pool)
    .await?;

    if let Some(chat) = inserted {
        return Ok((chat, true));
    }

    let chat = sqlx::query_as::<_, Chat>(
        "SELECT * FROM chats WHERE channel_id = $1 AND external_id = $2",
    )
    .bind(channel_id)
    .bind(external_id)
    .fetch_one(pool)
    .await?;
    Ok((chat, false))
}

/// Chats of a channel, most recently active first.
pub async fn list_for_channel(
    pool: &PgPool,
    channel_id: &str,
    assigned_user_id: Option<&str>,
    assigned: Option<bool>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Chat>, i64), sqlx::Error> {
    const FILTER: &str = r#"
        channel_id = $1
        AND ($2::text IS NULL OR assigned_user_id = $2)
        AND ($3::bool IS NULL OR (assigned_user_id IS NOT NULL) = $3)
    "#;

    let chats = sqlx::query_as::<_, Chat>(&format!(
        "SELECT * FROM chats WHERE {FILTER} ORDER BY last_message_ts DESC LIMIT $4 OFFSET $5"
    ))
    .bind(channel_id)
    .bind(assigned_user_id)
    .bind(assigned)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM chats WHERE {FILTER}"))
        .bind(channel_id)
        .bind(assigned_user_id)
        .bind(assigned)
        .fetch_one(pool)
        .await?;

    Ok((chats, total))
}

/// Set or clear the assigned operator.
pub async fn assign(
    pool: &PgPool,
    chat_id: &str,
    user_id: Option<&str>,
) -> Result<Option<Chat>, sqlx::Error> {
    sqlx::query_as::<_, Chat>("UPDATE chats SET assigned_user_id = $2 WHERE id = $1 RETURNING *")
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Record the newest message on the chat row.
pub async fn touch_last_message(
    pool: &PgPool,
    chat_id: &str,
    ts: DateTime<Utc>,
    sender_type: SenderType,
    content: &str,
) -> Result<Chat, sqlx::Error> {
    sqlx::query_as::<_, Chat>(
        r#"
        UPDATE chats SET last_message_ts = $2, last_sender_type = $3, last_message = $4
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(chat_id)
    .bind(ts)
    .bind(sender_type)
    .bind(content)
    .fetch_one(pool)
    .await
}
