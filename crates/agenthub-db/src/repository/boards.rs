//! Board repository. Soft-deleted boards are invisible to every read.

use agenthub_common::models::Board;
use sqlx::PgPool;

pub async fn create_board(pool: &PgPool, id: &str, name: &str, columns: &[String]) -> Result<Board, sqlx::Error> {
    sqlx::query_as::<_, Board>(
        "INSERT INTO boards (id, name, columns, is_deleted, created_at) VALUES ($1, $2, $3, FALSE, NOW()) RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(columns)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Board>, sqlx::Error> {
    sqlx::query_as::<_, Board>("SELECT * FROM boards WHERE id = $1 AND is_deleted = FALSE")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_boards(pool: &PgPool) -> Result<Vec<Board>, sqlx::Error> {
    sqlx::query_as::<_, Board>("SELECT * FROM boards WHERE is_deleted = FALSE ORDER BY created_at ASC")
        .fetch_all(pool)
        .await
}

pub async fn update_board(
    pool: &PgPool,
    id: &str,
    name: Option<&str>,
    columns: Option<&[String]>,
) -> Result<Option<Board>, sqlx::Error> {
    sqlx::query_as::<_, Board>(
        r#"
        UPDATE boards SET
            name = COALESCE($2, name),
            columns = COALESCE($3, columns)
        WHERE id = $1 AND is_deleted = FALSE
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(columns)
    .fetch_optional(pool)
    .await
}

pub async fn soft_delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE boards SET is_deleted = TRUE WHERE id = $1 AND is_deleted = FALSE")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove the board row; its tasks survive without a board.
pub async fn hard_delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE tasks SET board_id = NULL WHERE board_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM boards WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}
