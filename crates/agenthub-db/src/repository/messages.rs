//! Message repository.

use agenthub_common::models::{DeliveryStatus, Message, NewMessage};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub async fn create_message(pool: &PgPool, id: &str, msg: &NewMessage) -> Result<Message, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages
            (id, external_id, chat_id, content, sender_type, timestamp, meta_data, readed, delivery_status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, $8)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(msg.external_id.as_deref())
    .bind(&msg.chat_id)
    .bind(&msg.content)
    .bind(msg.sender_type)
    .bind(msg.timestamp)
    .bind(&msg.meta_data)
    .bind(msg.delivery_status)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Messages of a chat, newest first.
pub async fn list_for_chat(
    pool: &PgPool,
    chat_id: &str,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Message>, i64), sqlx::Error> {
    let messages = sqlx::query_as::<_, Message>(
        "SELECT * FROM messages WHERE chat_id = $1 ORDER BY timestamp DESC LIMIT $2 OFFSET $3",
    )
    .bind(chat_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE chat_id = $1")
        .bind(chat_id)
        .fetch_one(pool)
        .await?;

    Ok((messages, total))
}

/// The latest `limit` messages newer than `since`, returned oldest first.
pub async fn recent_for_chat(
    pool: &PgPool,
    chat_id: &str,
    since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        r#"
        SELECT * FROM (
            SELECT * FROM messages
            WHERE chat_id = $1 AND timestamp >= $2
            ORDER BY timestamp DESC
            LIMIT $3
        ) recent
        ORDER BY timestamp ASC
        "#,
    )
    .bind(chat_id)
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Store the outcome of an outbound platform delivery.
///
/// `meta_patch` is merged into the existing `meta_data` object.
pub async fn record_delivery(
    pool: &PgPool,
    id: &str,
    external_id: Option<&str>,
    status: DeliveryStatus,
    meta_patch: &serde_json::Value,
) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        r#"
        UPDATE messages SET
            external_id = COALESCE($2, external_id),
            delivery_status = $3,
            meta_data = meta_data || $4::jsonb
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(external_id)
    .bind(status)
    .bind(meta_patch)
    .fetch_optional(pool)
    .await
}

/// Apply a platform status callback to every message with that external id.
/// The raw status entry is appended to `meta_data.meta_status_history`.
pub async fn apply_status_update(
    pool: &PgPool,
    external_id: &str,
    status: DeliveryStatus,
    history_entry: &serde_json::Value,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE messages SET
            delivery_status = $2,
            meta_data = jsonb_set(
                meta_data,
                '{meta_status_history}',
                COALESCE(meta_data->'meta_status_history', '[]'::jsonb) || jsonb_build_array($3::jsonb)
            )
        WHERE external_id = $1
        "#,
    )
    .bind(external_id)
    .bind(status)
    .bind(history_entry)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Mark all unread contact messages of a chat as read.
pub async fn mark_read(pool: &PgPool, chat_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE messages SET readed = TRUE WHERE chat_id = $1 AND sender_type = 'CONTACT' AND readed = FALSE",
    )
    .bind(chat_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
