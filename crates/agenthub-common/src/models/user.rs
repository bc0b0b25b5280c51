//! User model: operators who log into the dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

/// An operator account.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub hashed_password: String,

    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Member,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Member => "MEMBER",
        }
    }
}

static USERNAME_REGEX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[a-zA-Z0-9_.@-]+$").expect("username regex"));

/// Body of `POST /auth/signup` and `POST /auth/users`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 64, message = "Username must be 3-64 characters"))]
    #[validate(regex(
        path = *USERNAME_REGEX,
        message = "Username can only contain letters, numbers, and . _ - @"
    ))]
    pub username: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 32))]
    pub phone: Option<String>,

    /// Ignored on signup (the first user is always an admin).
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 64))]
    #[validate(regex(path = *USERNAME_REGEX))]
    pub username: Option<String>,

    #[validate(length(min = 6, max = 128))]
    pub password: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 32))]
    pub phone: Option<String>,

    /// Admin only
    pub role: Option<UserRole>,
    /// Admin only
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    /// Whether the request touches fields only an admin may change.
    pub fn touches_privileged_fields(&self) -> bool {
        self.role.is_some() || self.is_active.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HasUsersResponse {
    pub has_users: bool,
}
