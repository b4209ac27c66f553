//! # TierTreff Sync Client - Library Root
//!
//! Real-time synchronization core of the TierTreff pet meetup platform:
//! presence, live chat, notification badges and post interactions, kept in
//! step with the server over REST and a STOMP message broker.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │              client (this crate)                       │
//! ├────────────────────────────────────────────────────────┤
//! │  Tokio             - Async runtime                     │
//! │  Reqwest           - HTTP client with cookie session   │
//! │  tokio-tungstenite - WebSocket transport for STOMP     │
//! │  tracing           - Structured logging                │
//! └────────────────────────────────────────────────────────┘
//!          │                              │
//!          │ HTTP                         │ WebSocket / STOMP
//!          ▼                              ▼
//! ┌─────────────────┐          ┌─────────────────────────┐
//! │  REST API       │          │   Message broker        │
//! │  /auth, /api    │          │   /user/queue, /app     │
//! └─────────────────┘          └─────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - **core**: Errors, configuration, the [`core::SocialApi`] seam and the
//!   [`core::SyncEvent`] bus
//! - **services**: REST client, STOMP codec and broker connection
//! - **sync**: Session, presence, chat, notifications, posts, friendships
//! - **utils**: Avatar resolution and input validation
//! - **debug**: File-based logging
//!
//! ### Module Dependency Graph
//!
//! ```text
//! main.rs
//!   │
//!   └── sync::Session
//!         ├── services::api       (REST)
//!         ├── services::realtime  (broker connections)
//!         └── core::events        (events towards the embedding app)
//! ```
//!
//! ## Core Concepts
//!
//! ### Optimistic Updates
//!
//! User actions change local state first and call the server afterwards.
//! A failed call restores the exact previous state and the error goes back
//! to the caller as a displayable message.
//!
//! ### Event-Driven Architecture
//!
//! Background work reports through an `async-channel` bus of
//! [`core::SyncEvent`]s; the embedding app drains it at its own pace.
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib
//! cargo test --lib sync::notifications
//! ```

pub mod core;
pub mod debug;
pub mod services;
pub mod sync;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use core::{AppError, Result};
pub use sync::Session;
