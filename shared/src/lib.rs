//! # Shared Data Transfer Objects Library
//!
//! This library defines the contract between the TierTreff sync client and the
//! REST API / message broker it talks to. All DTOs use JSON serialization via
//! `serde`.
//!
//! ## Structure
//!
//! - **[`dto`]**: Data Transfer Objects for API communication
//!   - **[`dto::auth`]**: Session, login and password reset DTOs
//!   - **[`dto::social`]**: Users, profiles, friendships and matches
//!   - **[`dto::notification`]**: The notification feed record
//!   - **[`dto::chat`]**: Chat messages (REST history and broker payloads)
//!   - **[`dto::post`]**: Comments, likes and post edits
//! - **[`utils`]**: Lenient field decoders and timestamp parsing
//!
//! ## Wire Format
//!
//! The server is a Spring application, so JSON field names are **camelCase**.
//! Every struct carries `#[serde(rename_all = "camelCase")]` and optional
//! fields default to `None` when the server leaves them out. Several server
//! responses are loosely typed (ids sent as numbers or strings, a resource
//! returned as an object or a list); those shapes go through the helpers in
//! [`utils`] instead of failing the whole response.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use shared::dto::chat::ChatMessage;
//!
//! let body = r#"{"senderUsername":"alice","recipientUsername":"bob","content":"hi"}"#;
//! let msg: ChatMessage = serde_json::from_str(body).unwrap();
//! assert!(msg.is_between("bob", "alice"));
//! ```

pub mod dto;
pub mod utils;

pub use dto::*;
