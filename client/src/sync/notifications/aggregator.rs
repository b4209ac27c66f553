//! Notification polling, classification and optimistic actions.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use shared::dto::RawNotification;
use shared::utils::parse_timestamp;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::classify::{
    describe, is_actionable, is_unread, Category, CategoryCounts, CategorySet, NotificationKind,
};
use crate::core::error::{AppError, Result};
use crate::core::events::{emit, EventSender, SyncEvent};
use crate::core::SocialApi;
use crate::sync::actor_cache::{Actor, ActorResolver};
use crate::sync::friendship::FriendshipStatus;

/// A classified, actor-enriched notification ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Option<String>,
    pub kind: NotificationKind,
    pub category: Category,
    pub actor: Actor,
    /// Whether the viewer can accept or decline it.
    pub actionable: bool,
    /// Text shown after the actor's name.
    pub text: &'static str,
    pub created_at: Option<DateTime<Utc>>,
    pub raw: RawNotification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Accept,
    Decline,
    MarkRead,
}

/// Marks one notification id as in flight until dropped, also when the
/// action's future is dropped mid-await.
struct InFlight<'a> {
    state: &'a RwLock<AggregatorState>,
    id: &'a str,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.write().busy.remove(self.id);
    }
}

#[derive(Default)]
struct AggregatorState {
    collections: [Vec<Notification>; 4],
    dismissed: HashSet<String>,
    busy: HashSet<String>,
}

impl AggregatorState {
    fn slot(category: Category) -> usize {
        Category::ALL
            .iter()
            .position(|c| *c == category)
            .unwrap_or_default()
    }

    fn collection(&self, category: Category) -> &Vec<Notification> {
        &self.collections[Self::slot(category)]
    }

    fn collection_mut(&mut self, category: Category) -> &mut Vec<Notification> {
        &mut self.collections[Self::slot(category)]
    }

    fn counts(&self) -> CategoryCounts {
        let mut counts = CategoryCounts::default();
        for category in Category::ALL {
            counts.set(category, self.collection(category).len());
        }
        counts
    }

    fn find(&self, id: &str) -> Option<Notification> {
        self.collections
            .iter()
            .flatten()
            .find(|n| n.id.as_deref() == Some(id))
            .cloned()
    }
}

struct Inner {
    api: Arc<dyn SocialApi>,
    actors: ActorResolver,
    viewer: Option<i64>,
    categories: CategorySet,
    poll_interval: Duration,
    state: RwLock<AggregatorState>,
    events: Option<EventSender>,
    cancel: CancellationToken,
}

/// Polls the notification feed and publishes one collection per tracked
/// category.
///
/// Every action dismisses optimistically: the id goes into a session-scoped
/// dismissed set and leaves its collection before the server is asked. A
/// failed call puts the notification back at the front of its collection.
/// Dismissed ids are filtered out of every later poll.
#[derive(Clone)]
pub struct NotificationAggregator {
    inner: Arc<Inner>,
}

impl NotificationAggregator {
    pub fn new(
        api: Arc<dyn SocialApi>,
        actors: ActorResolver,
        viewer: Option<i64>,
        categories: CategorySet,
        poll_interval: Duration,
        events: Option<EventSender>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                actors,
                viewer,
                categories,
                poll_interval,
                state: RwLock::new(AggregatorState::default()),
                events,
                cancel,
            }),
        }
    }

    /// Spawn the poll loop: one fetch right away, then one per interval,
    /// until the aggregator is closed.
    pub fn start(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(this.inner.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                interval_ms = this.inner.poll_interval.as_millis(),
                "Notification polling started"
            );

            loop {
                tokio::select! {
                    _ = this.inner.cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    _ = this.inner.cancel.cancelled() => break,
                    result = this.poll_once() => {
                        if let Err(e) = result {
                            debug!(error = %e, "Notification poll failed");
                        }
                    }
                }
            }
            info!("Notification polling stopped");
        })
    }

    /// Run one poll cycle. On failure the published collections are left as
    /// they were.
    pub async fn poll_once(&self) -> Result<CategoryCounts> {
        let inner = &self.inner;
        let mut feed = inner.api.list_notifications().await?;

        // Newest first; undated entries sort last.
        feed.sort_by_cached_key(|n| {
            std::cmp::Reverse(n.resolved_created_at().and_then(parse_timestamp))
        });

        let candidates: Vec<(RawNotification, NotificationKind, Category)> = {
            let state = inner.state.read();
            feed.into_iter()
                .filter(|n| n.resolved_id().map_or(true, |id| !state.dismissed.contains(id)))
                .filter(is_unread)
                .filter_map(|n| {
                    let kind = NotificationKind::of(&n);
                    let category = kind.category()?;
                    inner.categories.contains(category).then_some((n, kind, category))
                })
                .collect()
        };

        let actors = inner
            .actors
            .enrich(candidates.iter().map(|(n, _, _)| n.resolved_actor_id()))
            .await;

        if inner.cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let mut collections: [Vec<Notification>; 4] = Default::default();
        for ((raw, kind, category), actor) in candidates.into_iter().zip(actors) {
            let notification = Notification {
                id: raw.resolved_id().map(str::to_string),
                actionable: is_actionable(&kind, &raw, inner.viewer),
                text: describe(&kind, &raw, inner.viewer),
                created_at: raw.resolved_created_at().and_then(parse_timestamp),
                kind,
                category,
                actor,
                raw,
            };
            collections[AggregatorState::slot(category)].push(notification);
        }

        let counts = {
            let mut state = inner.state.write();
            // A dismissal may have landed while this cycle was in flight.
            for collection in collections.iter_mut() {
                collection.retain(|n| n.id.as_deref().map_or(true, |id| !state.dismissed.contains(id)));
            }
            state.collections = collections;
            state.counts()
        };

        debug!(
            friend_requests = counts.friend_requests,
            friend_outcomes = counts.friend_outcomes,
            match_interests = counts.match_interests,
            chat_messages = counts.chat_messages,
            "Notifications refreshed"
        );
        self.publish(counts);
        Ok(counts)
    }

    pub fn items(&self, category: Category) -> Vec<Notification> {
        self.inner.state.read().collection(category).clone()
    }

    pub fn counts(&self) -> CategoryCounts {
        self.inner.state.read().counts()
    }

    pub fn categories(&self) -> CategorySet {
        self.inner.categories
    }

    pub fn is_busy(&self, id: &str) -> bool {
        self.inner.state.read().busy.contains(id)
    }

    pub fn is_dismissed(&self, id: &str) -> bool {
        self.inner.state.read().dismissed.contains(id)
    }

    /// Accept a friend request or match interest.
    pub async fn accept(&self, id: &str) -> Result<()> {
        self.act(id, Action::Accept).await.map(|_| ())
    }

    /// Decline a friend request or match interest.
    pub async fn decline(&self, id: &str) -> Result<()> {
        self.act(id, Action::Decline).await.map(|_| ())
    }

    /// Acknowledge a notification that offers no accept/decline. For a chat
    /// notification, returns the peer to open a conversation with.
    pub async fn mark_read(&self, id: &str) -> Result<Option<i64>> {
        let notification = self.act(id, Action::MarkRead).await?;
        Ok(match notification.kind {
            NotificationKind::ChatMessage => notification.raw.resolved_actor_id(),
            _ => None,
        })
    }

    /// Stop polling and discard every in-flight result.
    pub fn close(&self) {
        self.inner.cancel.cancel();
    }

    async fn act(&self, id: &str, action: Action) -> Result<Notification> {
        let inner = &self.inner;
        let notification = inner
            .state
            .read()
            .find(id)
            .ok_or_else(|| AppError::Validation(format!("Unknown notification '{}'", id)))?;

        let ref_id = match action {
            Action::Accept | Action::Decline => {
                if !notification.actionable {
                    return Err(AppError::Validation("Notification cannot be accepted or declined".to_string()));
                }
                Some(
                    notification
                        .raw
                        .ref_id
                        .ok_or_else(|| AppError::Validation("Notification has no request reference".to_string()))?,
                )
            }
            Action::MarkRead => {
                if notification.actionable {
                    return Err(AppError::Validation("Notification needs to be accepted or declined".to_string()));
                }
                None
            }
        };

        // Optimistic dismissal.
        let (_in_flight, counts) = {
            let mut state = inner.state.write();
            if !state.busy.insert(id.to_string()) {
                return Err(AppError::Busy);
            }
            let in_flight = InFlight { state: &inner.state, id };
            state.dismissed.insert(id.to_string());
            state
                .collection_mut(notification.category)
                .retain(|n| n.id.as_deref() != Some(id));
            (in_flight, state.counts())
        };
        self.publish(counts);

        let result = match (action, &notification.kind, ref_id) {
            (Action::Accept, NotificationKind::FriendRequest, Some(ref_id)) => inner.api.accept_friendship(ref_id).await,
            (Action::Decline, NotificationKind::FriendRequest, Some(ref_id)) => inner.api.decline_friendship(ref_id).await,
            (Action::Accept, _, Some(ref_id)) => inner.api.accept_match_interest(ref_id).await,
            (Action::Decline, _, Some(ref_id)) => inner.api.decline_match_interest(ref_id).await,
            _ => inner.api.mark_notification_read(id).await,
        };

        if result.is_ok() && action != Action::MarkRead {
            if let Err(e) = inner.api.mark_notification_read(id).await {
                debug!(notification_id = id, error = %e, "Marking notification read failed");
            }
        }

        let counts = {
            let mut state = inner.state.write();
            if result.is_err() && !inner.cancel.is_cancelled() {
                state.dismissed.remove(id);
                state.collection_mut(notification.category).insert(0, notification.clone());
            }
            state.counts()
        };

        match result {
            Ok(()) => {
                info!(notification_id = id, action = ?action, kind = ?notification.kind, "Notification handled");
                if notification.kind == NotificationKind::FriendRequest {
                    let status = match action {
                        Action::Accept => FriendshipStatus::Accepted,
                        _ => FriendshipStatus::None,
                    };
                    if let Some(events) = &inner.events {
                        emit(
                            events,
                            SyncEvent::FriendshipChanged {
                                user_id: notification.raw.resolved_requester_id(),
                                status,
                            },
                        );
                    }
                }
                Ok(notification)
            }
            Err(e) => {
                warn!(notification_id = id, action = ?action, error = %e, "Notification action failed, restored");
                self.publish(counts);
                Err(e)
            }
        }
    }

    fn publish(&self, counts: CategoryCounts) {
        if self.inner.cancel.is_cancelled() {
            return;
        }
        if let Some(events) = &self.inner.events {
            emit(events, SyncEvent::NotificationsUpdated(counts));
        }
    }
}
