//! # Match API Client
//!
//! Current match, accepted peers and match-interest decisions.

use shared::dto::{OneOrMany, PeerDto};

use super::client::{decode, is_empty_status, ApiClient};
use crate::core::error::{AppError, Result};

/// Id of the session user's current match.
///
/// 204 means no match; older servers answer 404 for the same thing.
pub async fn current_match_id(client: &ApiClient) -> Result<Option<i64>> {
    let response = client
        .client
        .get(client.url("/api/match/current"))
        .send()
        .await
        .map_err(AppError::from)?;

    let status = response.status();
    if is_empty_status(status) {
        tracing::debug!(status = status.as_u16(), "No current match");
        return Ok(None);
    }
    if !status.is_success() {
        return Err(AppError::Http {
            status: status.as_u16(),
            message: "Failed to load current match".to_string(),
        });
    }

    let body = response.text().await.map_err(AppError::from)?;
    if body.trim().is_empty() || body.trim() == "null" {
        return Ok(None);
    }
    let id = serde_json::from_str::<i64>(body.trim())?;
    Ok(Some(id))
}

/// Peers who accepted the interest for `match_id`. The server returns a
/// single object or a list; 404 means nobody accepted yet.
pub async fn accepted_peers(client: &ApiClient, match_id: i64) -> Result<Vec<PeerDto>> {
    let response = client
        .client
        .get(client.url(&format!("/api/match/{}/accepted-peer", match_id)))
        .send()
        .await
        .map_err(AppError::from)?;

    let status = response.status();
    if is_empty_status(status) {
        return Ok(Vec::new());
    }
    if !status.is_success() {
        return Err(AppError::Http {
            status: status.as_u16(),
            message: "Failed to load accepted peers".to_string(),
        });
    }

    let peers: Option<OneOrMany<PeerDto>> = decode(response).await?;
    Ok(peers.map(OneOrMany::into_vec).unwrap_or_default())
}

#[tracing::instrument(skip(client))]
pub async fn accept_match_interest(client: &ApiClient, interest_id: i64) -> Result<()> {
    client
        .send_empty(
            client
                .client
                .post(client.url(&format!("/api/match/interests/{}/accept", interest_id))),
        )
        .await
}

#[tracing::instrument(skip(client))]
pub async fn decline_match_interest(client: &ApiClient, interest_id: i64) -> Result<()> {
    client
        .send_empty(
            client
                .client
                .post(client.url(&format!("/api/match/interests/{}/decline", interest_id))),
        )
        .await
}
