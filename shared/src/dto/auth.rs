//! # Authentication DTOs
//!
//! The session is cookie based: `POST /auth/login` sets the cookie, every later
//! request (including the WebSocket handshake) carries it.

use serde::{Deserialize, Serialize};

/// Response of `GET /auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of `POST /auth/forgot-password/start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordStartRequest {
    pub email: String,
}

/// Body of `POST /auth/forgot-password/verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordVerifyRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// Error body returned by the API on non-success statuses.
///
/// Spring sends either `message` or `error`; both are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    /// The most specific message available.
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}
