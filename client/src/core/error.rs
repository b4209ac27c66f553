//! # Common Error Types
//!
//! Consolidated error handling for the sync client.
//!
//! ## Error Categories
//!
//! - **Api / Http**: REST communication failures (network, status, JSON)
//! - **Unauthenticated**: `/auth/me` refused the session
//! - **Transport / NotConnected / Protocol**: broker connectivity and framing
//! - **Busy / Cancelled**: single-flight guards and torn-down scopes
//! - **Validation / Config**: bad input and bad environment
//!
//! None of these are fatal to the process. Each failure stays with the
//! operation that produced it: background work logs and carries on,
//! user-initiated work returns the error so the caller can show
//! `err.to_string()` inline.
//!
//! ```rust
//! use client::core::error::AppError;
//!
//! let err = AppError::Http { status: 409, message: "Request already exists".to_string() };
//! assert!(err.is_conflict());
//! assert_eq!(err.to_string(), "HTTP 409: Request already exists");
//! ```

use thiserror::Error;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Network failure or unparseable response body.
    #[error("API error: {0}")]
    Api(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The session cookie is missing or expired.
    #[error("Not authenticated")]
    Unauthenticated,

    /// WebSocket or STOMP connection failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A publish was attempted while the broker connection is down.
    #[error("Not connected to the message broker")]
    NotConnected,

    /// A frame or payload could not be decoded.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The operation is already in flight.
    #[error("Operation already in progress")]
    Busy,

    /// The owning scope was torn down before the result could be applied.
    #[error("Operation cancelled")]
    Cancelled,

    /// Input validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// HTTP status of the failure, if it came from the server.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            AppError::Unauthenticated => Some(401),
            _ => None,
        }
    }

    /// True for business-rule conflicts: HTTP 409, or a server message that
    /// says the resource already exists or is pending.
    pub fn is_conflict(&self) -> bool {
        match self {
            AppError::Http { status: 409, .. } => true,
            AppError::Http { message, .. } | AppError::Api(message) => {
                let lower = message.to_lowercase();
                ["already exists", "pending", "duplicate"]
                    .iter()
                    .any(|needle| lower.contains(needle))
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => AppError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => AppError::Api(format!("Network error: {}", err)),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Protocol(format!("Invalid JSON: {}", err))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for AppError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Api(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Api(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_detection() {
        assert!(AppError::Http { status: 409, message: String::new() }.is_conflict());
        assert!(AppError::Http { status: 400, message: "Friend request already exists".into() }.is_conflict());
        assert!(AppError::Api("Duplicate request".into()).is_conflict());
        assert!(!AppError::Http { status: 500, message: "boom".into() }.is_conflict());
        assert!(!AppError::NotConnected.is_conflict());
    }

    #[test]
    fn test_status() {
        assert_eq!(AppError::Http { status: 404, message: String::new() }.status(), Some(404));
        assert_eq!(AppError::Unauthenticated.status(), Some(401));
        assert_eq!(AppError::Busy.status(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(AppError::Validation("empty".into()).to_string(), "Validation error: empty");
        assert_eq!(AppError::Unauthenticated.to_string(), "Not authenticated");
    }
}
