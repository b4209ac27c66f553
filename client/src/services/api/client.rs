//! # API Client
//!
//! Main HTTP client for REST API communication.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use shared::dto::{
    ChatMessage, CommentDto, CommentPage, CurrentUser, ErrorResponse, FriendshipStatusDto,
    LikeUser, PeerDto, PostUpdate, ProfileDto, RawNotification, UserDto,
};

use crate::core::error::{AppError, Result};
use crate::core::service::{PageRequest, SocialApi};
use crate::core::Config;

use super::{auth, chat, friendships, matches, notifications, posts, users};

/// HTTP client for the TierTreff REST API.
///
/// The session is cookie based, so the client owns a cookie jar that is also
/// read when opening the broker WebSocket (see [`ApiClient::cookie_header`]).
pub struct ApiClient {
    pub(crate) client: Client,
    pub(crate) config: Config,
    jar: Arc<Jar>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// The client is configured with the configured request timeout so a
    /// stalled server cannot freeze a poll cycle indefinitely.
    pub fn new(config: Config) -> Self {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .timeout(config.http_timeout)
            .cookie_provider(jar.clone())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            });

        Self { client, config, jar }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn url(&self, path: &str) -> String {
        self.config.url(path)
    }

    /// `Cookie` header value for the API origin, if the session set any.
    pub fn cookie_header(&self) -> Option<String> {
        let url = Url::parse(&self.config.api_base).ok()?;
        self.jar
            .cookies(&url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Send a request and turn non-success statuses into [`AppError::Http`].
    pub(crate) async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::debug!(error = %e, "Request failed before a response arrived");
            AppError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|err| err.text().map(str::to_string))
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                } else {
                    body.trim().to_string()
                }
            });

        Err(AppError::Http {
            status: status.as_u16(),
            message,
        })
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(self.client.get(self.url(path))).await?;
        decode(response).await
    }

    /// Send a request whose response body is ignored.
    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        self.execute(request).await.map(|_| ())
    }
}

/// Decode a JSON body, reporting parse failures as API errors.
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| AppError::Api(format!("Failed to parse response: {}", e)))
}

/// True for the statuses the server uses to say "nothing here".
pub(crate) fn is_empty_status(status: StatusCode) -> bool {
    status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND
}

// Implement SocialApi for ApiClient by delegating to the per-resource modules.
#[async_trait::async_trait]
impl SocialApi for ApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<()> {
        auth::login(self, username, password).await
    }

    async fn me(&self) -> Result<CurrentUser> {
        auth::me(self).await
    }

    async fn roles(&self) -> Result<Vec<String>> {
        auth::roles(self).await
    }

    async fn logout(&self) -> Result<()> {
        auth::logout(self).await
    }

    async fn forgot_password_start(&self, email: &str) -> Result<()> {
        auth::forgot_password_start(self, email).await
    }

    async fn forgot_password_verify(&self, email: &str, code: &str, new_password: &str) -> Result<()> {
        auth::forgot_password_verify(self, email, code, new_password).await
    }

    async fn get_user(&self, user_id: i64) -> Result<UserDto> {
        users::get_user(self, user_id).await
    }

    async fn get_profile(&self, user_id: i64) -> Result<ProfileDto> {
        users::get_profile(self, user_id).await
    }

    async fn friends_of(&self, user_id: i64) -> Result<Vec<PeerDto>> {
        users::friends_of(self, user_id).await
    }

    async fn friendship_status(&self, user_id: i64) -> Result<FriendshipStatusDto> {
        friendships::friendship_status(self, user_id).await
    }

    async fn create_friendship(&self, friend_id: i64) -> Result<()> {
        friendships::create_friendship(self, friend_id).await
    }

    async fn accept_friendship(&self, request_id: i64) -> Result<()> {
        friendships::accept_friendship(self, request_id).await
    }

    async fn decline_friendship(&self, request_id: i64) -> Result<()> {
        friendships::decline_friendship(self, request_id).await
    }

    async fn delete_friendship(&self, user_id: i64) -> Result<()> {
        friendships::delete_friendship(self, user_id).await
    }

    async fn list_notifications(&self) -> Result<Vec<RawNotification>> {
        notifications::list_notifications(self).await
    }

    async fn mark_notification_read(&self, notification_id: &str) -> Result<()> {
        notifications::mark_notification_read(self, notification_id).await
    }

    async fn current_match_id(&self) -> Result<Option<i64>> {
        matches::current_match_id(self).await
    }

    async fn accepted_peers(&self, match_id: i64) -> Result<Vec<PeerDto>> {
        matches::accepted_peers(self, match_id).await
    }

    async fn accept_match_interest(&self, interest_id: i64) -> Result<()> {
        matches::accept_match_interest(self, interest_id).await
    }

    async fn decline_match_interest(&self, interest_id: i64) -> Result<()> {
        matches::decline_match_interest(self, interest_id).await
    }

    async fn chat_history(&self, user_a: i64, user_b: i64) -> Result<Vec<ChatMessage>> {
        chat::chat_history(self, user_a, user_b).await
    }

    async fn like_post(&self, post_id: i64) -> Result<()> {
        posts::like_post(self, post_id).await
    }

    async fn unlike_post(&self, post_id: i64) -> Result<()> {
        posts::unlike_post(self, post_id).await
    }

    async fn like_count(&self, post_id: i64) -> Result<Option<u64>> {
        posts::like_count(self, post_id).await
    }

    async fn like_users(&self, post_id: i64) -> Result<Vec<LikeUser>> {
        posts::like_users(self, post_id).await
    }

    async fn comments(&self, post_id: i64, page: &PageRequest) -> Result<CommentPage> {
        posts::comments(self, post_id, page).await
    }

    async fn add_comment(&self, post_id: i64, content: &str) -> Result<CommentDto> {
        posts::add_comment(self, post_id, content).await
    }

    async fn update_comment(&self, post_id: i64, comment_id: i64, content: &str) -> Result<Option<CommentDto>> {
        posts::update_comment(self, post_id, comment_id, content).await
    }

    async fn delete_comment(&self, post_id: i64, comment_id: i64) -> Result<()> {
        posts::delete_comment(self, post_id, comment_id).await
    }

    async fn update_post(&self, post_id: i64, update: &PostUpdate) -> Result<()> {
        posts::update_post(self, post_id, update).await
    }
}
