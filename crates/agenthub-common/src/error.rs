//! Centralized error types for Agent Hub.
//!
//! Uses `thiserror` for ergonomic error definitions and provides HTTP-friendly
//! error variants that can be directly converted to API responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Core application error type used across all Agent Hub services.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    // === Auth errors ===
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Not authenticated")]
    Unauthorized,

    // === Permission errors ===
    #[error("Admin access required")]
    AdminRequired,

    #[error("Admin or agent access required")]
    AdminOrAgentRequired,

    #[error("{message}")]
    Forbidden { message: String },

    // === Resource errors ===
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Not-found with a caller-supplied message, for cases where the plain
    /// "<resource> not found" wording would be misleading.
    #[error("{0}")]
    NotFoundDetail(String),

    #[error("{resource} already exists")]
    AlreadyExists { resource: String },

    // === Request errors ===
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("{0}")]
    BadRequest(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("{0}")]
    NotImplemented(String),

    // === Infrastructure errors ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body sent to clients.
#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    error: String,
    message: String,
}

impl HubError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Map error to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::InvalidToken | Self::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            Self::AdminRequired | Self::AdminOrAgentRequired | Self::Forbidden { .. } => {
                StatusCode::FORBIDDEN
            }
            Self::NotFound { .. } | Self::NotFoundDetail(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists { .. } => StatusCode::CONFLICT,
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) | Self::UnsupportedPlatform(_) => StatusCode::BAD_REQUEST,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error code string for programmatic handling by clients.
    pub fn error_code(&self) -> &str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::AdminRequired | Self::AdminOrAgentRequired | Self::Forbidden { .. } => {
                "FORBIDDEN"
            }
            Self::NotFound { .. } | Self::NotFoundDetail(_) => "NOT_FOUND",
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::UnsupportedPlatform(_) => "UNSUPPORTED_PLATFORM",
            Self::NotImplemented(_) => "NOT_IMPLEMENTED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't leak internal details to clients
        let message = match &self {
            HubError::Database(e) => {
                tracing::error!("Database error: {e}");
                "An internal error occurred".to_string()
            }
            HubError::Internal(e) => {
                tracing::error!("Internal error: {e:#}");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            code: status.as_u16(),
            error: self.error_code().to_string(),
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Convenience type alias for Results using HubError.
pub type HubResult<T> = Result<T, HubError>;
