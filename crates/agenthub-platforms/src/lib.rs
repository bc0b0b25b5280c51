//! # agenthub-platforms
//!
//! Adapters between Agent Hub and the messaging platforms it connects to:
//! - **inbound**: normalize webhook payloads (Twilio, Meta WhatsApp Cloud, Whapi, Telegram)
//!   into [`inbound::InboundEvent`]s
//! - **outbound**: deliver operator and agent replies back to the platform
//! - **signature**: verify Meta's `X-Hub-Signature-256` header

pub mod inbound;
pub mod outbound;
pub mod signature;

/// Errors raised while talking to or parsing data from a messaging platform.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid channel configuration: {0}")]
    InvalidConfig(String),

    #[error("{0} delivery is not supported")]
    NotSupported(String),

    #[error("Platform API returned HTTP {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Platform request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl PlatformError {
    /// Short machine-readable kind stored in message metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPayload(_) => "invalid_payload",
            Self::InvalidConfig(_) => "invalid_config",
            Self::NotSupported(_) => "not_supported",
            Self::Api { .. } => "http_error",
            Self::Request(_) => "request_error",
        }
    }

    /// HTTP status of a failed platform API call, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
