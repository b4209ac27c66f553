//! # Session
//!
//! An authenticated user session and the root of every component's
//! lifetime:
//!
//! ```text
//! Session (root CancellationToken)
//!   ├── PresenceChannel        ── one broker connection while logged in
//!   ├── MessageChannel         ── per chat box, own connection
//!   ├── NotificationAggregator ── per notification surface
//!   ├── PostInteraction        ── per post in view
//!   └── FriendshipTracker      ── per profile in view
//! ```
//!
//! Components get a child token, so [`Session::end`] tears all of them down
//! at once. They also share the session's API client and actor cache.

use std::sync::Arc;

use shared::dto::CurrentUser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::error::{AppError, Result};
use crate::core::events::EventSender;
use crate::core::{Config, SocialApi};
use crate::services::api::ApiClient;
use crate::services::realtime::{ConnectionConfig, RealtimeHandle};
use crate::sync::actor_cache::ActorResolver;
use crate::sync::contacts::Contacts;
use crate::sync::friendship::FriendshipTracker;
use crate::sync::message_channel::{ChatPeer, MessageChannel};
use crate::sync::notifications::{CategorySet, NotificationAggregator};
use crate::sync::posts::{PostInteraction, PostSummary};
use crate::sync::presence::PresenceChannel;
use crate::utils::validation::{validate_email, validate_new_password, validate_reset_code};

const ADMIN_ROLES: [&str; 2] = ["ROLE_ADMIN", "ADMIN"];
const CHAT_CHANNEL: &str = "chat";

pub struct Session {
    api: Arc<dyn SocialApi>,
    config: Config,
    user: CurrentUser,
    roles: Vec<String>,
    cookie: Option<String>,
    actors: ActorResolver,
    events: Option<EventSender>,
    presence: Option<PresenceChannel>,
    cancel: CancellationToken,
}

impl Session {
    /// Log in and start the session.
    pub async fn login(
        config: Config,
        username: &str,
        password: &str,
        events: Option<EventSender>,
    ) -> Result<Self> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Username and password are required".to_string(),
            ));
        }
        let client = Arc::new(ApiClient::new(config));
        client.login(username, password).await?;
        Self::start(client, events).await
    }

    /// Start a session on a client that already holds a session cookie.
    /// Opens the presence connection.
    pub async fn start(client: Arc<ApiClient>, events: Option<EventSender>) -> Result<Self> {
        let config = client.config().clone();
        let cookie = client.cookie_header();
        let mut session = Self::connect(client, config, cookie, events).await?;

        session.presence = Some(PresenceChannel::start(
            &session.config,
            session.cookie.clone(),
            session.events.clone(),
            session.cancel.child_token(),
        ));
        Ok(session)
    }

    /// Establish the session on any [`SocialApi`] without opening presence.
    pub async fn connect(
        api: Arc<dyn SocialApi>,
        config: Config,
        cookie: Option<String>,
        events: Option<EventSender>,
    ) -> Result<Self> {
        let user = api.me().await.map_err(|e| match e {
            AppError::Unauthenticated => e,
            other => {
                warn!(error = %other, "Session check failed");
                AppError::Unauthenticated
            }
        })?;

        let roles = api.roles().await.unwrap_or_else(|e| {
            warn!(error = %e, "Roles unavailable, continuing without");
            Vec::new()
        });

        info!(user_id = user.id, username = %user.username, roles = roles.len(), "Session started");

        let actors = ActorResolver::new(
            api.clone(),
            config.actor_cache_capacity,
            config.avatar_prefix.clone(),
        );

        Ok(Self {
            api,
            config,
            user,
            roles,
            cookie,
            actors,
            events,
            presence: None,
            cancel: CancellationToken::new(),
        })
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn me(&self) -> ChatPeer {
        ChatPeer::new(self.user.id, self.user.username.clone())
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn is_admin(&self) -> bool {
        self.roles
            .iter()
            .any(|role| ADMIN_ROLES.iter().any(|admin| role.trim().eq_ignore_ascii_case(admin)))
    }

    pub fn api(&self) -> Arc<dyn SocialApi> {
        self.api.clone()
    }

    pub fn actors(&self) -> &ActorResolver {
        &self.actors
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    pub fn is_online(&self) -> bool {
        self.presence.as_ref().is_some_and(PresenceChannel::is_connected)
    }

    /// A chat channel on its own broker connection, already subscribed to
    /// the user queue.
    pub fn message_channel(&self) -> MessageChannel {
        let cancel = self.cancel.child_token();
        let connection = RealtimeHandle::start(
            CHAT_CHANNEL,
            ConnectionConfig::from_config(&self.config, self.cookie.clone()),
            self.events.clone(),
            cancel.child_token(),
        );
        let channel = MessageChannel::with_connection(self.api.clone(), connection, self.events.clone(), cancel);
        channel.subscribe(self.user.id);
        channel
    }

    /// An aggregator for the given categories. Call
    /// [`NotificationAggregator::start`] to begin polling.
    pub fn notifications(&self, categories: CategorySet) -> NotificationAggregator {
        NotificationAggregator::new(
            self.api.clone(),
            self.actors.clone(),
            Some(self.user.id),
            categories,
            self.config.poll_interval,
            self.events.clone(),
            self.cancel.child_token(),
        )
    }

    pub fn post(&self, post: PostSummary) -> PostInteraction {
        PostInteraction::new(
            self.api.clone(),
            self.actors.clone(),
            Some(self.user.id),
            post,
            self.cancel.child_token(),
        )
    }

    pub fn friendship(&self, subject: i64) -> FriendshipTracker {
        FriendshipTracker::new(
            self.api.clone(),
            Some(self.user.id),
            subject,
            self.events.clone(),
            self.cancel.child_token(),
        )
    }

    pub async fn contacts(&self) -> Result<Contacts> {
        Contacts::load(&self.api, self.user.id, &self.config.avatar_prefix).await
    }

    /// Log out on the server, then end the session either way.
    pub async fn logout(&self) -> Result<()> {
        let result = self.api.logout().await;
        if let Err(e) = &result {
            warn!(error = %e, "Logout request failed");
        }
        self.end().await;
        result
    }

    /// Cancel every component of this session and close presence.
    pub async fn end(&self) {
        self.cancel.cancel();
        if let Some(presence) = &self.presence {
            presence.stop().await;
        }
        info!(user_id = self.user.id, "Session ended");
    }
}

/// Ask for a password reset code to be mailed.
pub async fn forgot_password_start(api: &dyn SocialApi, email: &str) -> Result<()> {
    validate_email(email).into_result()?;
    api.forgot_password_start(email.trim()).await
}

/// Set a new password with the mailed code.
pub async fn forgot_password_verify(
    api: &dyn SocialApi,
    email: &str,
    code: &str,
    new_password: &str,
) -> Result<()> {
    validate_email(email).into_result()?;
    validate_reset_code(code).into_result()?;
    validate_new_password(new_password).into_result()?;
    api.forgot_password_verify(email.trim(), code.trim(), new_password).await
}
