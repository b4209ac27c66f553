//! # Sync Components
//!
//! Client-side state that tracks the server in near real time.
//!
//! ```text
//! sync/
//! ├── session.rs          - Login, roles, component factories, teardown
//! ├── presence.rs         - Online marker: one long-lived broker connection
//! ├── message_channel.rs  - Live chat queue merged with REST history
//! ├── notifications/      - Polled feed split into four badge collections
//! ├── actor_cache.rs      - Bounded id -> (username, avatar) lookup cache
//! ├── posts.rs            - Likes and comments with optimistic updates
//! ├── friendship.rs       - Friend request state for one profile
//! └── contacts.rs         - Friends and match peers to chat with
//! ```
//!
//! Every component owns a [`tokio_util::sync::CancellationToken`] derived
//! from its [`session::Session`]. Results that arrive after the token is
//! cancelled are discarded instead of applied.

pub mod actor_cache;
pub mod contacts;
pub mod friendship;
pub mod message_channel;
pub mod notifications;
pub mod posts;
pub mod presence;
pub mod session;

pub use actor_cache::{Actor, ActorResolver, BoundedCache};
pub use contacts::{Contact, Contacts};
pub use friendship::{FriendshipStatus, FriendshipTracker};
pub use message_channel::{ChatLog, ChatPeer, MessageChannel};
pub use notifications::{Category, CategoryCounts, CategorySet, Notification, NotificationAggregator};
pub use posts::{CommentView, PostInteraction, PostState, PostSummary};
pub use presence::PresenceChannel;
pub use session::Session;
