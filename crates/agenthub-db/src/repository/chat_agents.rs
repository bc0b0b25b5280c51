//! Chat-agent link repository.

use agenthub_common::models::{ChatAgent, ChatAgentDetail};
use sqlx::PgPool;

const DETAIL_SELECT: &str = r#"
    SELECT ca.id, ca.chat_id, ca.agent_id, ca.active,
           a.name AS agent_name, a.webhook_url AS agent_webhook_url, a.is_active AS agent_is_active
    FROM chat_agents ca
    JOIN agents a ON a.id = ca.agent_id
"#;

/// Link an agent to a chat. An existing link is left untouched.
pub async fn create_link(
    pool: &PgPool,
    id: &str,
    chat_id: &str,
    agent_id: &str,
    active: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO chat_agents (id, chat_id, agent_id, active) VALUES ($1, $2, $3, $4)
        ON CONFLICT (chat_id, agent_id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(chat_id)
    .bind(agent_id)
    .bind(active)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<ChatAgent>, sqlx::Error> {
    sqlx::query_as::<_, ChatAgent>("SELECT * FROM chat_agents WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_for_chat(
    pool: &PgPool,
    chat_id: &str,
    agent_id: &str,
) -> Result<Option<ChatAgent>, sqlx::Error> {
    sqlx::query_as::<_, ChatAgent>("SELECT * FROM chat_agents WHERE chat_id = $1 AND agent_id = $2")
        .bind(chat_id)
        .bind(agent_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_detail(
    pool: &PgPool,
    chat_id: &str,
    agent_id: &str,
) -> Result<Option<ChatAgentDetail>, sqlx::Error> {
    sqlx::query_as::<_, ChatAgentDetail>(&format!(
        "{DETAIL_SELECT} WHERE ca.chat_id = $1 AND ca.agent_id = $2"
    ))
    .bind(chat_id)
    .bind(agent_id)
    .fetch_optional(pool)
    .await
}

/// Links of a chat filtered by `active`, ordered by agent name.
pub async fn list_details(
    pool: &PgPool,
    chat_id: &str,
    active: bool,
    limit: i64,
    offset: i64,
) -> Result<(Vec<ChatAgentDetail>, i64), sqlx::Error> {
    let items = sqlx::query_as::<_, ChatAgentDetail>(&format!(
        "{DETAIL_SELECT} WHERE ca.chat_id = $1 AND ca.active = $2 ORDER BY a.name ASC LIMIT $3 OFFSET $4"
    ))
    .bind(chat_id)
    .bind(active)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM chat_agents WHERE chat_id = $1 AND active = $2",
    )
    .bind(chat_id)
    .bind(active)
    .fetch_one(pool)
    .await?;

    Ok((items, total))
}

/// Active links of a chat: the agents an incoming message is dispatched to.
pub async fn list_active_for_chat(pool: &PgPool, chat_id: &str) -> Result<Vec<ChatAgent>, sqlx::Error> {
    sqlx::query_as::<_, ChatAgent>("SELECT * FROM chat_agents WHERE chat_id = $1 AND active = TRUE")
        .bind(chat_id)
        .fetch_all(pool)
        .await
}

pub async fn set_active(
    pool: &PgPool,
    chat_id: &str,
    agent_id: &str,
    active: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE chat_agents SET active = $3 WHERE chat_id = $1 AND agent_id = $2")
        .bind(chat_id)
        .bind(agent_id)
        .bind(active)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
