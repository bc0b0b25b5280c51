//! PostgreSQL setup and connection helpers.

use sqlx::PgPool;

/// Health check: verify the database is reachable.
pub async fn health_check(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}

/// Names of the application tables that exist in the connected database.
pub async fn existing_tables(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT table_name::text FROM information_schema.tables
        WHERE table_schema = 'public' AND table_name <> '_sqlx_migrations'
        ORDER BY table_name
        "#,
    )
    .fetch_all(pool)
    .await
}
