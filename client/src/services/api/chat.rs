//! # Chat History Endpoint

use shared::dto::ChatMessage;

use super::client::ApiClient;
use crate::core::error::Result;

/// Persisted messages exchanged between two users, oldest first.
pub async fn chat_history(client: &ApiClient, user_a: i64, user_b: i64) -> Result<Vec<ChatMessage>> {
    client.get_json(&format!("/api/chat/history/{}/{}", user_a, user_b)).await
}
