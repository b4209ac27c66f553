//! # Notification Endpoints

use serde_json::Value;
use shared::dto::RawNotification;
use tracing::debug;

use super::client::ApiClient;
use crate::core::error::Result;

/// Notification feed of the session user, all entries (read and unread).
pub async fn list_notifications(client: &ApiClient) -> Result<Vec<RawNotification>> {
    let entries: Vec<Value> = client.get_json("/api/notifications").await?;
    Ok(decode_feed(entries))
}

/// Decode feed entries one by one; an entry that does not fit is skipped.
fn decode_feed(entries: Vec<Value>) -> Vec<RawNotification> {
    let total = entries.len();
    let decoded: Vec<RawNotification> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(notification) => Some(notification),
            Err(e) => {
                debug!(index, error = %e, "Skipping undecodable notification");
                None
            }
        })
        .collect();
    if decoded.len() < total {
        debug!(total, skipped = total - decoded.len(), "Notification feed partially decoded");
    }
    decoded
}

pub async fn mark_notification_read(client: &ApiClient, notification_id: &str) -> Result<()> {
    client
        .send_empty(
            client
                .client
                .post(client.url(&format!("/api/notifications/{}/read", notification_id))),
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_entry_does_not_hide_the_rest() {
        let feed: Vec<Value> = serde_json::from_str(
            r#"[
                {"id":"n1","type":"FRIEND_REQUEST","read":false,"actorId":7},
                {"id":"n2","type":"CHAT","status":{"code":1}},
                {"id":"n3","type":"CHAT","read":0,"createdAt":[2025,5,3,18,21,4]},
                "not an object"
            ]"#,
        )
        .unwrap();

        let decoded = decode_feed(feed);
        let ids: Vec<_> = decoded.iter().filter_map(|n| n.resolved_id()).collect();
        assert_eq!(ids, vec!["n1", "n3"]);
        assert_eq!(decoded[1].read, Some(false));
    }
}
