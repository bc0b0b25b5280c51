//! Agent repository.

use agenthub_common::models::Agent;
use sqlx::PgPool;

#[allow(clippy::too_many_arguments)]
pub async fn create_agent(
    pool: &PgPool,
    id: &str,
    name: &str,
    webhook_url: Option<&str>,
    is_fire_and_forget: bool,
    buffer_time_seconds: i32,
    history_msg_count: i32,
    recent_msg_window_minutes: i32,
    activate_for_new_conversation: bool,
) -> Result<Agent, sqlx::Error> {
    sqlx::query_as::<_, Agent>(
        r#"
        INSERT INTO agents
            (id, name, webhook_url, is_active, is_fire_and_forget, buffer_time_seconds,
             history_msg_count, recent_msg_window_minutes, activate_for_new_conversation, created_at)
        VALUES ($1, $2, $3, TRUE, $4, $5, $6, $7, $8, NOW())
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(webhook_url)
    .bind(is_fire_and_forget)
    .bind(buffer_time_seconds)
    .bind(history_msg_count)
    .bind(recent_msg_window_minutes)
    .bind(activate_for_new_conversation)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Agent>, sqlx::Error> {
    sqlx::query_as::<_, Agent>("SELECT * FROM agents WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_agents(pool: &PgPool, is_active: bool) -> Result<Vec<Agent>, sqlx::Error> {
    sqlx::query_as::<_, Agent>("SELECT * FROM agents WHERE is_active = $1 ORDER BY name ASC")
        .bind(is_active)
        .fetch_all(pool)
        .await
}

/// Agents that should be linked to every newly created chat.
pub async fn list_dispatchable(pool: &PgPool) -> Result<Vec<Agent>, sqlx::Error> {
    sqlx::query_as::<_, Agent>(
        "SELECT * FROM agents WHERE is_active = TRUE AND webhook_url IS NOT NULL ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn update_agent(
    pool: &PgPool,
    id: &str,
    name: Option<&str>,
    webhook_url: Option<&str>,
    is_active: Option<bool>,
    is_fire_and_forget: Option<bool>,
    buffer_time_seconds: Option<i32>,
    history_msg_count: Option<i32>,
    recent_msg_window_minutes: Option<i32>,
    activate_for_new_conversation: Option<bool>,
) -> Result<Option<Agent>, sqlx::Error> {
    sqlx::query_as::<_, Agent>(
        r#"
        UPDATE agents SET
            name = COALESCE($2, name),
            webhook_url = COALESCE($3, webhook_url),
            is_active = COALESCE($4, is_active),
            is_fire_and_forget = COALESCE($5, is_fire_and_forget),
            buffer_time_seconds = COALESCE($6, buffer_time_seconds),
            history_msg_count = COALESCE($7, history_msg_count),
            recent_msg_window_minutes = COALESCE($8, recent_msg_window_minutes),
            activate_for_new_conversation = COALESCE($9, activate_for_new_conversation)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(webhook_url)
    .bind(is_active)
    .bind(is_fire_and_forget)
    .bind(buffer_time_seconds)
    .bind(history_msg_count)
    .bind(recent_msg_window_minutes)
    .bind(activate_for_new_conversation)
    .fetch_optional(pool)
    .await
}

/// Soft delete: deactivate the agent and revoke its tokens.
pub async fn deactivate(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE agents SET is_active = FALSE WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        r#"
        UPDATE tokens SET is_revoked = TRUE
        WHERE id IN (SELECT token_id FROM token_agents WHERE agent_id = $1)
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await
}

/// Hard delete: remove the agent, its tokens and its chat links.
pub async fn delete_agent(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM tokens WHERE id IN (SELECT token_id FROM token_agents WHERE agent_id = $1)")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM chat_agents WHERE agent_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM agents WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}
