//! # Services Module
//!
//! External integrations for the TierTreff sync client.
//!
//! ```text
//! services/
//! ├── api.rs       - REST client (session, users, friendships, notifications,
//! │                  matches, chat history, posts)
//! ├── realtime.rs  - STOMP-over-WebSocket broker connection with reconnect
//! └── stomp.rs     - STOMP 1.2 frame codec
//! ```
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   sync components                    │
//! │  ┌──────────────────┐       ┌──────────────────────┐ │
//! │  │  ApiClient       │       │  RealtimeHandle      │ │
//! │  │  (api.rs)        │       │  (realtime.rs)       │ │
//! │  └────────┬─────────┘       └──────────┬───────────┘ │
//! └───────────┼────────────────────────────┼─────────────┘
//!             │ HTTP/JSON + session cookie │ WebSocket + STOMP
//!             ▼                            ▼
//! ┌──────────────────────────────────────────────────────┐
//! │  TierTreff backend  (/auth/*, /api/*, /ws/websocket) │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The session cookie captured by [`api::ApiClient`] during login is
//! forwarded on the WebSocket handshake so the broker sees the same user.

pub mod api;
pub mod realtime;
pub mod stomp;
