//! # User and Profile Endpoints

use shared::dto::{PeerDto, ProfileDto, UserDto};

use super::client::ApiClient;
use crate::core::error::Result;

pub async fn get_user(client: &ApiClient, user_id: i64) -> Result<UserDto> {
    client.get_json(&format!("/api/users/{}", user_id)).await
}

pub async fn get_profile(client: &ApiClient, user_id: i64) -> Result<ProfileDto> {
    client.get_json(&format!("/api/profiles/user/{}", user_id)).await
}

/// Friends of a user.
pub async fn friends_of(client: &ApiClient, user_id: i64) -> Result<Vec<PeerDto>> {
    client.get_json(&format!("/api/users/{}/friends", user_id)).await
}
