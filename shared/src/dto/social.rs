//! # Social Graph DTOs
//!
//! Users, profiles, friendships and match peers.

use serde::{Deserialize, Serialize};

use crate::utils::lenient_i64;

/// Response of `GET /api/users/{id}` and entries of the user search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
}

/// Response of `GET /api/profiles/user/{userId}` and `GET /api/profiles/me`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDto {
    #[serde(default)]
    pub url_profile_picture: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub topics: Option<String>,
    #[serde(default)]
    pub days: Option<String>,
    #[serde(default)]
    pub allow_messages: Option<bool>,
}

/// Response of `GET /api/friendships/status/{userId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FriendshipStatusDto {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
}

/// Body of `POST /api/friendships`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendshipCreateRequest {
    pub friend_id: i64,
}

/// Nested user reference inside a [`PeerDto`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedUser {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

/// A friend or match peer as returned by the friends and accepted-peer
/// endpoints. The server uses several shapes, so every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerDto {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub friend_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub user: Option<NestedUser>,
    #[serde(default)]
    pub friend: Option<NestedUser>,
}

impl PeerDto {
    pub fn resolved_id(&self) -> Option<i64> {
        self.id
            .or(self.user_id)
            .or_else(|| self.user.as_ref().and_then(|u| u.id))
            .or(self.friend_id)
    }

    /// Trimmed username, `None` when empty.
    pub fn resolved_username(&self) -> Option<String> {
        self.username
            .clone()
            .or_else(|| self.user.as_ref().and_then(|u| u.username.clone()))
            .or_else(|| self.friend.as_ref().and_then(|u| u.username.clone()))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn resolved_picture(&self) -> Option<String> {
        self.profile_picture
            .clone()
            .or_else(|| self.user.as_ref().and_then(|u| u.profile_picture.clone()))
    }
}

/// A resource the server returns either as one object or as a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}
