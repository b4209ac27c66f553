//! # Friendship API Client
//!
//! HTTP client functions for friend requests and friendship status.

use shared::dto::{FriendshipCreateRequest, FriendshipStatusDto};

use super::client::ApiClient;
use crate::core::error::Result;

/// Friendship status between the session user and `user_id`.
pub async fn friendship_status(client: &ApiClient, user_id: i64) -> Result<FriendshipStatusDto> {
    client.get_json(&format!("/api/friendships/status/{}", user_id)).await
}

/// Send a friend request. A duplicate request answers 409.
#[tracing::instrument(skip(client))]
pub async fn create_friendship(client: &ApiClient, friend_id: i64) -> Result<()> {
    let request = FriendshipCreateRequest { friend_id };
    client
        .send_empty(client.client.post(client.url("/api/friendships")).json(&request))
        .await
}

/// Accept a friend request by its request id (the notification's `refId`).
#[tracing::instrument(skip(client))]
pub async fn accept_friendship(client: &ApiClient, request_id: i64) -> Result<()> {
    client
        .send_empty(client.client.post(client.url(&format!("/api/friendships/{}/accept", request_id))))
        .await
}

/// Decline a friend request by its request id.
#[tracing::instrument(skip(client))]
pub async fn decline_friendship(client: &ApiClient, request_id: i64) -> Result<()> {
    client
        .send_empty(client.client.post(client.url(&format!("/api/friendships/{}/decline", request_id))))
        .await
}

/// Cancel a pending request to, or remove the friendship with, `user_id`.
#[tracing::instrument(skip(client))]
pub async fn delete_friendship(client: &ApiClient, user_id: i64) -> Result<()> {
    client
        .send_empty(client.client.delete(client.url(&format!("/api/friendships/{}", user_id))))
        .await
}
