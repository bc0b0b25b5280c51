//! User repository: CRUD operations for operator accounts.

use agenthub_common::models::{User, UserRole};
use sqlx::PgPool;

/// Create a new user account.
pub async fn create_user(
    pool: &PgPool,
    id: &str,
    username: &str,
    email: Option<&str>,
    phone: Option<&str>,
    hashed_password: &str,
    role: UserRole,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, email, phone, hashed_password, role, is_active, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, TRUE, NOW())
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(username)
    .bind(email)
    .bind(phone)
    .bind(hashed_password)
    .bind(role)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

/// Whether a username, email or phone is already taken by another user.
pub async fn identity_taken(
    pool: &PgPool,
    username: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
    exclude_id: Option<&str>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM users
            WHERE (username = $1 OR email = $2 OR phone = $3)
              AND ($4::text IS NULL OR id <> $4)
        )
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(phone)
    .bind(exclude_id)
    .fetch_one(pool)
    .await
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at ASC")
        .fetch_all(pool)
        .await
}

/// Total number of accounts, active or not.
pub async fn count_users(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
}

/// Update user fields; `None` keeps the current value.
#[allow(clippy::too_many_arguments)]
pub async fn update_user(
    pool: &PgPool,
    id: &str,
    username: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
    hashed_password: Option<&str>,
    role: Option<UserRole>,
    is_active: Option<bool>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            username = COALESCE($2, username),
            email = COALESCE($3, email),
            phone = COALESCE($4, phone),
            hashed_password = COALESCE($5, hashed_password),
            role = COALESCE($6, role),
            is_active = COALESCE($7, is_active)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(username)
    .bind(email)
    .bind(phone)
    .bind(hashed_password)
    .bind(role)
    .bind(is_active)
    .fetch_optional(pool)
    .await
}
