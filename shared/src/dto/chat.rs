//! # Chat DTOs
//!
//! The same [`ChatMessage`] shape is returned by the history endpoint and
//! delivered on the `/user/queue/messages` broker destination.

use serde::{Deserialize, Serialize};

use crate::utils::lenient_i64;

/// A persisted or live chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub sender_username: String,
    pub recipient_username: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
}

impl ChatMessage {
    /// True if this message belongs to the conversation between `a` and `b`,
    /// in either direction.
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.sender_username == a && self.recipient_username == b)
            || (self.sender_username == b && self.recipient_username == a)
    }
}

/// Payload published to `/app/chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingChatMessage {
    pub recipient_id: i64,
    pub content: String,
}
