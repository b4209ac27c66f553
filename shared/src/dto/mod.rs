//! # Data Transfer Objects (DTOs)
//!
//! Data structures exchanged with the TierTreff REST API and message broker.
//!
//! ## Module Organization
//!
//! - [`auth`] - Current user, login and password reset
//! - [`social`] - Users, profiles, friendship status and match peers
//! - [`notification`] - Polymorphic notification records
//! - [`chat`] - Chat messages
//! - [`post`] - Comments, likes and post edits
//!
//! ## Example JSON Communication
//!
//! ```text
//! GET /api/notifications
//!
//! [
//!   {
//!     "id": 17,
//!     "type": "FRIEND_REQUEST",
//!     "actorId": 7,
//!     "refId": 42,
//!     "read": false,
//!     "createdAt": "2025-05-03T18:21:04.311",
//!     "title": "New friend request"
//!   }
//! ]
//! ```

pub mod auth;
pub mod chat;
pub mod notification;
pub mod post;
pub mod social;

pub use auth::*;
pub use chat::*;
pub use notification::*;
pub use post::*;
pub use social::*;
