//! # REST API Client
//!
//! One module per resource; [`ApiClient`] implements
//! [`crate::core::SocialApi`] by delegating to them.

pub mod auth;
pub mod chat;
pub mod client;
pub mod friendships;
pub mod matches;
pub mod notifications;
pub mod posts;
pub mod users;

pub use client::ApiClient;
