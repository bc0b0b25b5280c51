//! Menu repository.

use agenthub_common::models::Menu;
use sqlx::PgPool;

pub async fn create_menu(pool: &PgPool, id: &str, icon: &str, url: &str) -> Result<Menu, sqlx::Error> {
    sqlx::query_as::<_, Menu>("INSERT INTO menus (id, icon, url) VALUES ($1, $2, $3) RETURNING *")
        .bind(id)
        .bind(icon)
        .bind(url)
        .fetch_one(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Menu>, sqlx::Error> {
    sqlx::query_as::<_, Menu>("SELECT * FROM menus WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_menus(pool: &PgPool) -> Result<Vec<Menu>, sqlx::Error> {
    sqlx::query_as::<_, Menu>("SELECT * FROM menus ORDER BY id ASC")
        .fetch_all(pool)
        .await
}

pub async fn update_menu(
    pool: &PgPool,
    id: &str,
    icon: Option<&str>,
    url: Option<&str>,
) -> Result<Option<Menu>, sqlx::Error> {
    sqlx::query_as::<_, Menu>(
        "UPDATE menus SET icon = COALESCE($2, icon), url = COALESCE($3, url) WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(icon)
    .bind(url)
    .fetch_optional(pool)
    .await
}

pub async fn delete_menu(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM menus WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
