//! # Core Abstractions
//!
//! Foundational types used throughout the sync client:
//!
//! - **[`error`]**: Application error types (`AppError`, `Result<T>`)
//! - **[`config`]**: Environment-driven configuration
//! - **[`service`]**: The [`SocialApi`] trait for dependency injection
//! - **[`events`]**: The [`SyncEvent`] bus towards the embedding app
//!
//! ## Dependency Injection
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use client::core::{Config, SocialApi};
//! use client::services::api::ApiClient;
//!
//! let api: Arc<dyn SocialApi> = Arc::new(ApiClient::new(Config::default()));
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod service;

pub use config::{config, init_config, Config};
pub use error::{AppError, Result};
pub use events::{event_bus, EventSender, SyncEvent};
pub use service::{PageRequest, SocialApi};
