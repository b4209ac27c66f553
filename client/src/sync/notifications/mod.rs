//! # Notification Aggregator
//!
//! Turns the loosely shaped notification feed into four badge collections:
//!
//! ```text
//! GET /api/notifications
//!        │
//!        ▼
//! sort newest first ─► drop dismissed ─► keep unread ─► classify ─► enrich actors
//!                                                          │
//!        ┌───────────────┬──────────────────┬──────────────┴───┐
//!        ▼               ▼                  ▼                  ▼
//!  friend requests  friend outcomes   match interests    chat messages
//! ```
//!
//! One [`NotificationAggregator`] serves every notification surface; a
//! [`CategorySet`] selects which collections it tracks.

pub mod aggregator;
pub mod classify;

pub use aggregator::{Notification, NotificationAggregator};
pub use classify::{
    describe, is_actionable, is_unread, normalize_type, Category, CategoryCounts, CategorySet,
    FriendOutcome, NotificationKind,
};
