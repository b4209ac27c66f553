//! # Utility Functions
//!
//! Small helpers shared across the sync client.
//!
//! ## Modules
//!
//! - **[`avatar`]**: Avatar source resolution and the default avatar
//! - **[`validation`]**: Input validation for user-initiated actions
//!
//! ## Related Modules
//!
//! - [`shared::utils`]: Lenient JSON field decoding and timestamp parsing
//! - [`crate::core`]: Core abstractions and error types

pub mod avatar;
pub mod validation;

pub use avatar::{resolve_avatar_src, DEFAULT_AVATAR_URL};
