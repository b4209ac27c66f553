//! # Sync Events
//!
//! Events emitted by the sync components towards the embedding application.
//! Components hold an `async_channel::Sender<SyncEvent>`; the application
//! drains the receiver on its own loop and re-renders.

use shared::dto::ChatMessage;

use crate::sync::friendship::FriendshipStatus;
use crate::sync::notifications::CategoryCounts;

/// Events produced by background synchronization.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// The broker connection went up (`true`) or down (`false`).
    ConnectionChanged { channel: &'static str, connected: bool },
    /// A live chat message arrived on the user queue.
    ChatMessageReceived(ChatMessage),
    /// History for a conversation pair replaced the held messages.
    HistoryLoaded { user_a: String, user_b: String, count: usize },
    /// The notification collections were republished.
    NotificationsUpdated(CategoryCounts),
    /// A friend request was accepted or declined from a notification.
    FriendshipChanged { user_id: Option<i64>, status: FriendshipStatus },
}

/// Sender half of the event bus.
pub type EventSender = async_channel::Sender<SyncEvent>;

/// Create an unbounded event bus.
pub fn event_bus() -> (EventSender, async_channel::Receiver<SyncEvent>) {
    async_channel::unbounded()
}

/// Send without awaiting; a closed bus only means nobody is listening.
pub(crate) fn emit(tx: &EventSender, event: SyncEvent) {
    if let Err(e) = tx.try_send(event) {
        tracing::trace!(error = %e, "Event bus closed, dropping event");
    }
}
