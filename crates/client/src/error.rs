//! Unified client error type.
//!
//! Services return `Result<T, ClientError>`. Flows classify failures with
//! [`ClientError::status`]: expected rejections (401 on login, 400 on
//! registration) become inline messages, anything else is an error route.

use reqwest::StatusCode;
use thiserror::Error;

use crate::api::ApiError;
use crate::cache::CacheError;

/// Client-level error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Local cache read or write failed.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// An authenticated operation was requested without a session token.
    #[error("Not logged in")]
    MissingToken,
}

impl ClientError {
    /// HTTP status of a backend rejection.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api(err) => err.status(),
            _ => None,
        }
    }

    /// Message the backend attached to a rejection.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api(ApiError::Status { message, .. }) => Some(message),
            _ => None,
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;
