//! # Message Channel
//!
//! Live one-to-one chat on top of the broker connection.
//!
//! - Inbound messages arrive on the per-user queue and are appended.
//! - History for a conversation pair replaces whatever was held for that
//!   pair and leaves every other pair alone.
//! - Outbound messages are published without a local echo; the server
//!   delivers them back through the user queue.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use shared::dto::{ChatMessage, OutgoingChatMessage};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::error::{AppError, Result};
use crate::core::events::{emit, EventSender, SyncEvent};
use crate::core::SocialApi;
use crate::services::realtime::{MessageTransport, RealtimeHandle};

/// Inbound per-user queue.
pub const USER_QUEUE: &str = "/user/queue/messages";
/// Outbound application destination.
pub const CHAT_DESTINATION: &str = "/app/chat";

/// One side of a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPeer {
    pub id: i64,
    pub username: String,
}

impl ChatPeer {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// Messages held by a channel, in arrival order.
#[derive(Debug, Default, Clone)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Drop every message of the pair and append `history` in its place.
    pub fn replace_pair(&mut self, a: &str, b: &str, history: Vec<ChatMessage>) {
        self.messages.retain(|m| !m.is_between(a, b));
        self.messages.extend(history);
    }

    /// Messages of the pair, in either direction.
    pub fn visible(&self, a: &str, b: &str) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.is_between(a, b))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

struct Inner {
    api: Arc<dyn SocialApi>,
    transport: Arc<dyn MessageTransport>,
    connection: Option<RealtimeHandle>,
    log: RwLock<ChatLog>,
    pump: Mutex<Option<JoinHandle<()>>>,
    events: Option<EventSender>,
    cancel: CancellationToken,
}

impl Inner {
    /// Parse one inbound payload and append it. Malformed payloads are
    /// logged and dropped.
    fn accept_payload(&self, body: &str) -> Option<ChatMessage> {
        let message = match serde_json::from_str::<ChatMessage>(body) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, body_len = body.len(), "Dropping malformed chat payload");
                return None;
            }
        };
        if self.cancel.is_cancelled() {
            return None;
        }

        self.log.write().push(message.clone());
        debug!(
            from = %message.sender_username,
            to = %message.recipient_username,
            "Chat message received"
        );
        if let Some(events) = &self.events {
            emit(events, SyncEvent::ChatMessageReceived(message.clone()));
        }
        Some(message)
    }
}

/// Chat for one signed-in user.
#[derive(Clone)]
pub struct MessageChannel {
    inner: Arc<Inner>,
}

impl MessageChannel {
    /// Channel over an existing transport.
    pub fn new(
        api: Arc<dyn SocialApi>,
        transport: Arc<dyn MessageTransport>,
        events: Option<EventSender>,
        cancel: CancellationToken,
    ) -> Self {
        Self::build(api, transport, None, events, cancel)
    }

    /// Channel that owns its broker connection and shuts it down on close.
    pub fn with_connection(
        api: Arc<dyn SocialApi>,
        connection: RealtimeHandle,
        events: Option<EventSender>,
        cancel: CancellationToken,
    ) -> Self {
        let transport: Arc<dyn MessageTransport> = Arc::new(connection.clone());
        Self::build(api, transport, Some(connection), events, cancel)
    }

    fn build(
        api: Arc<dyn SocialApi>,
        transport: Arc<dyn MessageTransport>,
        connection: Option<RealtimeHandle>,
        events: Option<EventSender>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                transport,
                connection,
                log: RwLock::new(ChatLog::default()),
                pump: Mutex::new(None),
                events,
                cancel,
            }),
        }
    }

    /// Subscribe to the user queue. The transport re-issues the subscription
    /// on every reconnect, so this is called once per channel; repeated calls
    /// are ignored.
    pub fn subscribe(&self, current_user: i64) {
        let mut pump = self.inner.pump.lock();
        if pump.is_some() || self.inner.cancel.is_cancelled() {
            return;
        }

        let inner = self.inner.clone();
        let mut subscription = inner.transport.subscribe(USER_QUEUE);
        info!(user_id = current_user, destination = USER_QUEUE, "Chat subscription opened");

        *pump = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = inner.cancel.cancelled() => break,
                    frame = subscription.recv() => match frame {
                        Some(frame) => {
                            inner.accept_payload(&frame.body);
                        }
                        None => break,
                    },
                }
            }
            debug!(user_id = current_user, "Chat subscription closed");
        }));
    }

    /// Load persisted history for the pair and replace what is held for it.
    /// Returns the number of history messages.
    pub async fn load_history(&self, me: &ChatPeer, peer: &ChatPeer) -> Result<usize> {
        let history = self.inner.api.chat_history(me.id, peer.id).await.map_err(|e| {
            warn!(peer_id = peer.id, error = %e, "Failed to load chat history");
            e
        })?;

        if self.inner.cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let count = history.len();
        self.inner
            .log
            .write()
            .replace_pair(&me.username, &peer.username, history);

        if let Some(events) = &self.inner.events {
            emit(
                events,
                SyncEvent::HistoryLoaded {
                    user_a: me.username.clone(),
                    user_b: peer.username.clone(),
                    count,
                },
            );
        }
        Ok(count)
    }

    /// Publish a message. Returns `Ok(false)` without sending when the text
    /// is blank or the broker is not connected.
    pub fn send(&self, recipient_id: i64, content: &str) -> Result<bool> {
        let content = content.trim();
        if content.is_empty() || !self.inner.transport.is_connected() || self.inner.cancel.is_cancelled() {
            return Ok(false);
        }

        let body = serde_json::to_string(&OutgoingChatMessage {
            recipient_id,
            content: content.to_string(),
        })?;
        match self.inner.transport.publish(CHAT_DESTINATION, body) {
            Ok(()) => Ok(true),
            Err(AppError::NotConnected) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Messages between the two usernames, in arrival order.
    pub fn visible(&self, a: &str, b: &str) -> Vec<ChatMessage> {
        self.inner.log.read().visible(a, b)
    }

    pub fn is_connected(&self) -> bool {
        self.inner.transport.is_connected()
    }

    /// Tear down: stop the pump (dropping the subscription unsubscribes) and
    /// close the owned connection, if any.
    pub async fn close(&self) {
        self.inner.cancel.cancel();
        let pump = self.inner.pump.lock().take();
        if let Some(pump) = pump {
            let _ = pump.await;
        }
        if let Some(connection) = &self.inner.connection {
            connection.shutdown().await;
        }
    }
}
