//! Task repository. Soft-deleted tasks are invisible to every read.

use agenthub_common::models::Task;
use sqlx::PgPool;

pub async fn create_task(
    pool: &PgPool,
    id: &str,
    board_id: Option<&str>,
    column: &str,
    chat_id: Option<&str>,
    title: &str,
    description: Option<&str>,
) -> Result<Task, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (id, board_id, column_name, chat_id, title, description, is_deleted, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(board_id)
    .bind(column)
    .bind(chat_id)
    .bind(title)
    .bind(description)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1 AND is_deleted = FALSE")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Whether the row exists at all, deleted or not.
pub async fn exists_any(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM tasks WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn list_tasks(pool: &PgPool, board_id: Option<&str>) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        SELECT * FROM tasks
        WHERE is_deleted = FALSE AND ($1::text IS NULL OR board_id = $1)
        ORDER BY created_at ASC
        "#,
    )
    .bind(board_id)
    .fetch_all(pool)
    .await
}

pub async fn update_task(
    pool: &PgPool,
    id: &str,
    board_id: Option<&str>,
    column: Option<&str>,
    chat_id: Option<&str>,
    title: Option<&str>,
    description: Option<&str>,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks SET
            board_id = COALESCE($2, board_id),
            column_name = COALESCE($3, column_name),
            chat_id = COALESCE($4, chat_id),
            title = COALESCE($5, title),
            description = COALESCE($6, description),
            updated_at = NOW()
        WHERE id = $1 AND is_deleted = FALSE
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(board_id)
    .bind(column)
    .bind(chat_id)
    .bind(title)
    .bind(description)
    .fetch_optional(pool)
    .await
}

pub async fn soft_delete(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE tasks SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove the task and its note/document links. The notes and documents themselves are kept.
pub async fn hard_delete(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM task_notes WHERE task_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM task_documents WHERE task_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}
