//! # Friendship Status
//!
//! Tracks the viewer's friendship with one other user and applies
//! add / cancel / remove optimistically.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::error::{AppError, Result};
use crate::core::events::{emit, EventSender, SyncEvent};
use crate::core::SocialApi;

/// Friendship state between the viewer and another user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FriendshipStatus {
    #[default]
    None,
    Pending,
    Accepted,
}

impl FriendshipStatus {
    /// Map the server's many spellings onto the three states.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "ACCEPTED" | "FRIENDS" | "FRIEND" | "APPROVED" => FriendshipStatus::Accepted,
            "PENDING" | "REQUESTED" => FriendshipStatus::Pending,
            _ => FriendshipStatus::None,
        }
    }
}

impl fmt::Display for FriendshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FriendshipStatus::None => "NONE",
            FriendshipStatus::Pending => "PENDING",
            FriendshipStatus::Accepted => "ACCEPTED",
        };
        f.write_str(s)
    }
}

/// Friendship between `viewer` and `subject`, as seen on the subject's
/// profile.
pub struct FriendshipTracker {
    api: Arc<dyn SocialApi>,
    viewer: Option<i64>,
    subject: i64,
    status: RwLock<FriendshipStatus>,
    busy: AtomicBool,
    events: Option<EventSender>,
    cancel: CancellationToken,
}

impl FriendshipTracker {
    pub fn new(
        api: Arc<dyn SocialApi>,
        viewer: Option<i64>,
        subject: i64,
        events: Option<EventSender>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api,
            viewer,
            subject,
            status: RwLock::new(FriendshipStatus::None),
            busy: AtomicBool::new(false),
            events,
            cancel,
        }
    }

    pub fn status(&self) -> FriendshipStatus {
        *self.status.read()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn is_self(&self) -> bool {
        self.viewer == Some(self.subject)
    }

    /// Fetch the current status; any failure reads as `None`.
    pub async fn load(&self) -> FriendshipStatus {
        let status = match self.api.friendship_status(self.subject).await {
            Ok(dto) => dto
                .status
                .as_deref()
                .map(FriendshipStatus::normalize)
                .unwrap_or_default(),
            Err(e) => {
                debug!(subject = self.subject, error = %e, "Friendship status unavailable");
                FriendshipStatus::None
            }
        };
        self.commit(status);
        self.status()
    }

    /// Status pushed from elsewhere, e.g. a notification action.
    pub fn apply_server_status(&self, raw: &str) {
        self.commit(FriendshipStatus::normalize(raw));
    }

    /// Send a friend request. Does nothing for the viewer's own profile or
    /// when a request or friendship already exists.
    pub async fn request(&self) -> Result<FriendshipStatus> {
        if self.is_self() || self.status() != FriendshipStatus::None {
            return Ok(self.status());
        }
        let _guard = self.enter()?;

        let previous = self.swap(FriendshipStatus::Pending);
        match self.api.create_friendship(self.subject).await {
            Ok(()) => {
                info!(subject = self.subject, "Friend request sent");
            }
            Err(e) if e.is_conflict() => {
                debug!(subject = self.subject, error = %e, "Friend request already exists");
            }
            Err(e) => {
                warn!(subject = self.subject, error = %e, "Friend request failed");
                self.commit(previous);
                return Err(e);
            }
        }
        self.announce();
        Ok(self.status())
    }

    /// Withdraw a pending request.
    pub async fn cancel_request(&self) -> Result<FriendshipStatus> {
        if self.status() != FriendshipStatus::Pending {
            return Ok(self.status());
        }
        self.delete().await
    }

    /// End an accepted friendship.
    pub async fn remove(&self) -> Result<FriendshipStatus> {
        if self.status() != FriendshipStatus::Accepted {
            return Ok(self.status());
        }
        self.delete().await
    }

    async fn delete(&self) -> Result<FriendshipStatus> {
        let _guard = self.enter()?;
        let previous = self.swap(FriendshipStatus::None);
        if let Err(e) = self.api.delete_friendship(self.subject).await {
            warn!(subject = self.subject, error = %e, "Removing friendship failed");
            self.commit(previous);
            return Err(e);
        }
        self.announce();
        Ok(self.status())
    }

    fn enter(&self) -> Result<BusyGuard<'_>> {
        BusyGuard::acquire(&self.busy)
    }

    fn swap(&self, next: FriendshipStatus) -> FriendshipStatus {
        std::mem::replace(&mut *self.status.write(), next)
    }

    fn commit(&self, status: FriendshipStatus) {
        if !self.cancel.is_cancelled() {
            *self.status.write() = status;
        }
    }

    fn announce(&self) {
        if let Some(events) = &self.events {
            emit(
                events,
                SyncEvent::FriendshipChanged {
                    user_id: Some(self.subject),
                    status: self.status(),
                },
            );
        }
    }
}

/// Single-flight flag holder. Released on drop, including when the future
/// holding it is dropped mid-await.
pub(crate) struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        if flag.swap(true, Ordering::SeqCst) {
            return Err(AppError::Busy);
        }
        Ok(Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;

    fn tracker(mock: &Arc<MockApi>, viewer: i64, subject: i64) -> FriendshipTracker {
        FriendshipTracker::new(mock.clone(), Some(viewer), subject, None, CancellationToken::new())
    }

    #[test]
    fn test_normalize() {
        assert_eq!(FriendshipStatus::normalize("friends"), FriendshipStatus::Accepted);
        assert_eq!(FriendshipStatus::normalize(" APPROVED "), FriendshipStatus::Accepted);
        assert_eq!(FriendshipStatus::normalize("requested"), FriendshipStatus::Pending);
        assert_eq!(FriendshipStatus::normalize("DECLINED"), FriendshipStatus::None);
        assert_eq!(FriendshipStatus::normalize(""), FriendshipStatus::None);
    }

    #[tokio::test]
    async fn test_load_errors_read_as_none() {
        let mock = Arc::new(MockApi::new());
        mock.set_friendship_status(Some("FRIEND"));
        let t = tracker(&mock, 1, 2);
        assert_eq!(t.load().await, FriendshipStatus::Accepted);

        mock.fail("friendship_status");
        assert_eq!(t.load().await, FriendshipStatus::None);
    }

    #[tokio::test]
    async fn test_request_conflict_is_pending() {
        let mock = Arc::new(MockApi::new());
        mock.fail_with("create_friendship", 409, "Conflict");
        let t = tracker(&mock, 1, 2);

        assert_eq!(t.request().await.unwrap(), FriendshipStatus::Pending);
        assert!(!t.is_busy());
    }

    #[tokio::test]
    async fn test_request_failure_rolls_back() {
        let mock = Arc::new(MockApi::new());
        mock.fail("create_friendship");
        let t = tracker(&mock, 1, 2);

        assert!(t.request().await.is_err());
        assert_eq!(t.status(), FriendshipStatus::None);
        assert!(!t.is_busy());
    }

    #[tokio::test]
    async fn test_request_skips_self_and_existing() {
        let mock = Arc::new(MockApi::new());
        let own = tracker(&mock, 3, 3);
        assert_eq!(own.request().await.unwrap(), FriendshipStatus::None);

        let t = tracker(&mock, 1, 2);
        t.apply_server_status("ACCEPTED");
        assert_eq!(t.request().await.unwrap(), FriendshipStatus::Accepted);
        assert_eq!(mock.call_count("create_friendship"), 0);
    }

    #[tokio::test]
    async fn test_remove_rolls_back_on_failure() {
        let mock = Arc::new(MockApi::new());
        let t = tracker(&mock, 1, 2);
        t.apply_server_status("ACCEPTED");

        mock.fail("delete_friendship");
        assert!(t.remove().await.is_err());
        assert_eq!(t.status(), FriendshipStatus::Accepted);

        mock.succeed("delete_friendship");
        assert_eq!(t.remove().await.unwrap(), FriendshipStatus::None);
        assert!(mock.called_with("delete_friendship", "2"));
    }
}
