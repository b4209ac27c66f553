//! # Notification DTOs
//!
//! `GET /api/notifications` returns a list of loosely shaped records: the
//! notification id, its type and the participant ids each appear under
//! several names depending on which server feature produced the entry.
//! [`RawNotification`] keeps every variant field and exposes resolver
//! methods that apply the lookup order once.

use serde::{Deserialize, Serialize};

use crate::utils::{lenient_bool, lenient_i64, lenient_id, lenient_timestamp, present_nullable};

/// One entry of the notification feed, exactly as the server sent it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawNotification {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub notification_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub uuid: Option<String>,
    #[serde(default, rename = "_id", deserialize_with = "lenient_id")]
    pub underscore_id: Option<String>,

    #[serde(default, rename = "type")]
    pub kind_type: Option<String>,
    #[serde(default)]
    pub notification_type: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_i64")]
    pub actor_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub sender_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub recipient_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub receiver_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub requester_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub initiator_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub from_user_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub ref_id: Option<i64>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub read: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "present_nullable", skip_serializing_if = "Option::is_none")]
    pub read_at: Option<Option<String>>,

    /// Explicit outcome discriminant (`ACCEPTED` / `DECLINED`) for request
    /// updates. Older servers leave it out.
    #[serde(default)]
    pub outcome: Option<String>,

    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RawNotification {
    /// `id`, then `notificationId`, `uuid`, `_id`.
    pub fn resolved_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .or(self.notification_id.as_deref())
            .or(self.uuid.as_deref())
            .or(self.underscore_id.as_deref())
    }

    /// `type`, then `notificationType`, `kind`, `eventType`.
    pub fn raw_type(&self) -> Option<&str> {
        self.kind_type
            .as_deref()
            .or(self.notification_type.as_deref())
            .or(self.kind.as_deref())
            .or(self.event_type.as_deref())
    }

    /// The user who triggered the event.
    pub fn resolved_actor_id(&self) -> Option<i64> {
        self.actor_id.or(self.sender_id)
    }

    pub fn resolved_recipient_id(&self) -> Option<i64> {
        self.recipient_id.or(self.receiver_id)
    }

    pub fn resolved_requester_id(&self) -> Option<i64> {
        self.requester_id
            .or(self.sender_id)
            .or(self.initiator_id)
            .or(self.from_user_id)
            .or(self.actor_id)
    }

    /// `status`, then `state`, uppercased; empty when neither is set.
    pub fn status_upper(&self) -> String {
        self.status
            .as_deref()
            .or(self.state.as_deref())
            .unwrap_or_default()
            .trim()
            .to_uppercase()
    }

    /// `createdAt`, then `timestamp`.
    pub fn resolved_created_at(&self) -> Option<&str> {
        self.created_at.as_deref().or(self.timestamp.as_deref())
    }

    /// Title and message joined by a space, for text heuristics.
    pub fn text(&self) -> String {
        format!(
            "{} {}",
            self.title.as_deref().unwrap_or_default(),
            self.message.as_deref().unwrap_or_default()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_resolution_order() {
        let n: RawNotification = serde_json::from_str(
            r#"{
                "notificationId": 55,
                "notificationType": "match interest",
                "senderId": 4,
                "receiverId": "9",
                "initiatorId": 6,
                "state": "new",
                "readAt": null,
                "timestamp": "2025-01-01T00:00:00"
            }"#,
        )
        .unwrap();

        assert_eq!(n.resolved_id(), Some("55"));
        assert_eq!(n.raw_type(), Some("match interest"));
        assert_eq!(n.resolved_actor_id(), Some(4));
        assert_eq!(n.resolved_recipient_id(), Some(9));
        assert_eq!(n.resolved_requester_id(), Some(4));
        assert_eq!(n.status_upper(), "NEW");
        assert_eq!(n.read_at, Some(None));
        assert_eq!(n.resolved_created_at(), Some("2025-01-01T00:00:00"));
    }

    #[test]
    fn test_minimal_record() {
        let n: RawNotification =
            serde_json::from_str(r#"{"id":"n1","type":"FRIEND_REQUEST","read":false,"actorId":7,"refId":42}"#)
                .unwrap();
        assert_eq!(n.resolved_id(), Some("n1"));
        assert_eq!(n.read, Some(false));
        assert_eq!(n.ref_id, Some(42));
        assert_eq!(n.read_at, None);
        assert_eq!(n.text(), " ");
    }

    #[test]
    fn test_java_shaped_fields() {
        let n: RawNotification = serde_json::from_str(
            r#"{"id":"n2","type":"CHAT","read":0,"createdAt":[2025,5,3,18,21,4]}"#,
        )
        .unwrap();
        assert_eq!(n.read, Some(false));
        assert_eq!(n.resolved_created_at(), Some("2025-05-03T18:21:04"));
    }
}
