//! # Service Traits
//!
//! [`SocialApi`] is the seam between the sync components and the REST API.
//! Production code uses [`crate::services::api::ApiClient`]; tests inject a
//! scripted mock.

use async_trait::async_trait;
use shared::dto::{
    ChatMessage, CommentDto, CommentPage, CurrentUser, FriendshipStatusDto, LikeUser, PeerDto,
    PostUpdate, ProfileDto, RawNotification, UserDto,
};

use super::error::Result;

/// Page request for comment listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Option<String>,
}

impl PageRequest {
    /// The one-element page used to read `totalElements` only.
    pub fn count_only() -> Self {
        Self {
            page: 0,
            size: 1,
            sort: None,
        }
    }

    /// First page of the newest comments.
    pub fn newest(size: u32) -> Self {
        Self {
            page: 0,
            size,
            sort: Some("createdAt,DESC".to_string()),
        }
    }
}

/// REST operations consumed by the sync layer.
#[async_trait]
pub trait SocialApi: Send + Sync {
    // --- session ---

    async fn login(&self, username: &str, password: &str) -> Result<()>;

    /// `GET /auth/me`; a non-success status maps to `AppError::Unauthenticated`.
    async fn me(&self) -> Result<CurrentUser>;

    async fn roles(&self) -> Result<Vec<String>>;

    async fn logout(&self) -> Result<()>;

    async fn forgot_password_start(&self, email: &str) -> Result<()>;

    async fn forgot_password_verify(&self, email: &str, code: &str, new_password: &str) -> Result<()>;

    // --- users and profiles ---

    async fn get_user(&self, user_id: i64) -> Result<UserDto>;

    async fn get_profile(&self, user_id: i64) -> Result<ProfileDto>;

    async fn friends_of(&self, user_id: i64) -> Result<Vec<PeerDto>>;

    // --- friendships ---

    async fn friendship_status(&self, user_id: i64) -> Result<FriendshipStatusDto>;

    async fn create_friendship(&self, friend_id: i64) -> Result<()>;

    async fn accept_friendship(&self, request_id: i64) -> Result<()>;

    async fn decline_friendship(&self, request_id: i64) -> Result<()>;

    /// Cancels a pending request or removes an accepted friendship.
    async fn delete_friendship(&self, user_id: i64) -> Result<()>;

    // --- notifications ---

    async fn list_notifications(&self) -> Result<Vec<RawNotification>>;

    async fn mark_notification_read(&self, notification_id: &str) -> Result<()>;

    // --- matches ---

    /// `None` when the user has no current match (204, or 404 on older servers).
    async fn current_match_id(&self) -> Result<Option<i64>>;

    async fn accepted_peers(&self, match_id: i64) -> Result<Vec<PeerDto>>;

    async fn accept_match_interest(&self, interest_id: i64) -> Result<()>;

    async fn decline_match_interest(&self, interest_id: i64) -> Result<()>;

    // --- chat ---

    async fn chat_history(&self, user_a: i64, user_b: i64) -> Result<Vec<ChatMessage>>;

    // --- posts ---

    async fn like_post(&self, post_id: i64) -> Result<()>;

    async fn unlike_post(&self, post_id: i64) -> Result<()>;

    async fn like_count(&self, post_id: i64) -> Result<Option<u64>>;

    async fn like_users(&self, post_id: i64) -> Result<Vec<LikeUser>>;

    async fn comments(&self, post_id: i64, page: &PageRequest) -> Result<CommentPage>;

    async fn add_comment(&self, post_id: i64, content: &str) -> Result<CommentDto>;

    /// Returns the updated comment when the server echoes it.
    async fn update_comment(&self, post_id: i64, comment_id: i64, content: &str) -> Result<Option<CommentDto>>;

    async fn delete_comment(&self, post_id: i64, comment_id: i64) -> Result<()>;

    async fn update_post(&self, post_id: i64, update: &PostUpdate) -> Result<()>;
}
