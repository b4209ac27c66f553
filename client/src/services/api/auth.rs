//! # Authentication Endpoints
//!
//! Login, session introspection, logout and password reset.

use shared::dto::{CurrentUser, ForgotPasswordStartRequest, ForgotPasswordVerifyRequest, LoginRequest};

use super::client::{decode, ApiClient};
use crate::core::error::{AppError, Result};

/// Login with username and password; the server sets the session cookie.
#[tracing::instrument(skip_all, fields(username = %username))]
pub async fn login(client: &ApiClient, username: &str, password: &str) -> Result<()> {
    tracing::info!("Attempting login");
    let start = std::time::Instant::now();

    let request = LoginRequest {
        username: username.trim().to_string(),
        password: password.to_string(),
    };

    let result = client
        .send_empty(client.client.post(client.url("/auth/login")).json(&request))
        .await;

    match &result {
        Ok(()) => tracing::info!(duration_ms = start.elapsed().as_millis(), "Login successful"),
        Err(e) => tracing::warn!(
            error = %e,
            duration_ms = start.elapsed().as_millis(),
            "Login failed"
        ),
    }
    result
}

/// Current session user. Any non-success status means the session is gone.
pub async fn me(client: &ApiClient) -> Result<CurrentUser> {
    let response = client
        .client
        .get(client.url("/auth/me"))
        .send()
        .await
        .map_err(AppError::from)?;

    if !response.status().is_success() {
        tracing::debug!(status = response.status().as_u16(), "Session check rejected");
        return Err(AppError::Unauthenticated);
    }
    decode(response).await
}

pub async fn roles(client: &ApiClient) -> Result<Vec<String>> {
    client.get_json("/auth/roles").await
}

pub async fn logout(client: &ApiClient) -> Result<()> {
    client.send_empty(client.client.post(client.url("/auth/logout"))).await
}

/// Ask the server to mail a reset code. The server answers the same way
/// whether or not the address exists.
pub async fn forgot_password_start(client: &ApiClient, email: &str) -> Result<()> {
    let request = ForgotPasswordStartRequest {
        email: email.trim().to_string(),
    };
    client
        .send_empty(client.client.post(client.url("/auth/forgot-password/start")).json(&request))
        .await
}

pub async fn forgot_password_verify(client: &ApiClient, email: &str, code: &str, new_password: &str) -> Result<()> {
    let request = ForgotPasswordVerifyRequest {
        email: email.trim().to_string(),
        code: code.trim().to_string(),
        new_password: new_password.to_string(),
    };
    client
        .send_empty(client.client.post(client.url("/auth/forgot-password/verify")).json(&request))
        .await
}
