//! # Contacts
//!
//! The people a user can chat with: friends plus the accepted peers of the
//! current match.

use std::collections::HashSet;
use std::sync::Arc;

use shared::dto::PeerDto;
use tracing::{debug, warn};

use crate::core::error::Result;
use crate::core::SocialApi;
use crate::sync::message_channel::ChatPeer;
use crate::utils::resolve_avatar_src;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: i64,
    pub username: String,
    pub avatar_url: String,
}

impl Contact {
    /// Entries without a numeric id or a non-empty username are dropped.
    fn from_peer(peer: &PeerDto, avatar_prefix: &str) -> Option<Self> {
        Some(Self {
            id: peer.resolved_id()?,
            username: peer.resolved_username()?,
            avatar_url: resolve_avatar_src(peer.resolved_picture().as_deref(), avatar_prefix),
        })
    }

    pub fn as_peer(&self) -> ChatPeer {
        ChatPeer::new(self.id, self.username.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contacts {
    pub friends: Vec<Contact>,
    pub match_id: Option<i64>,
    pub match_peers: Vec<Contact>,
}

impl Contacts {
    /// Load friends and match peers for `me`. A failing friends list is an
    /// error; match lookups that fail just mean "no match".
    pub async fn load(api: &Arc<dyn SocialApi>, me: i64, avatar_prefix: &str) -> Result<Self> {
        let (friends, match_id) = tokio::join!(api.friends_of(me), api.current_match_id());

        let friends = normalize(friends?, me, avatar_prefix);

        let match_id = match_id.unwrap_or_else(|e| {
            debug!(error = %e, "Current match unavailable");
            None
        });

        let match_peers = match match_id {
            Some(id) => match api.accepted_peers(id).await {
                Ok(peers) => normalize(peers, me, avatar_prefix),
                Err(e) => {
                    warn!(match_id = id, error = %e, "Failed to load match peers");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        debug!(
            friends = friends.len(),
            match_peers = match_peers.len(),
            "Contacts loaded"
        );

        Ok(Self {
            friends,
            match_id,
            match_peers,
        })
    }

    /// Friends first, then match peers that are not already friends.
    pub fn all(&self) -> Vec<Contact> {
        let mut seen = HashSet::new();
        self.friends
            .iter()
            .chain(self.match_peers.iter())
            .filter(|c| seen.insert(c.id))
            .cloned()
            .collect()
    }

    pub fn find(&self, id: i64) -> Option<&Contact> {
        self.friends
            .iter()
            .chain(self.match_peers.iter())
            .find(|c| c.id == id)
    }
}

fn normalize(peers: Vec<PeerDto>, me: i64, avatar_prefix: &str) -> Vec<Contact> {
    let mut seen = HashSet::new();
    peers
        .iter()
        .filter_map(|peer| Contact::from_peer(peer, avatar_prefix))
        .filter(|c| c.id != me && seen.insert(c.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;
    use crate::utils::DEFAULT_AVATAR_URL;

    fn peer(id: Option<i64>, username: Option<&str>) -> PeerDto {
        PeerDto {
            id,
            username: username.map(str::to_string),
            ..PeerDto::default()
        }
    }

    #[tokio::test]
    async fn test_load_friends_and_match_peers() {
        let mock = Arc::new(MockApi::new());
        mock.set_friends(vec![peer(Some(2), Some("luna")), peer(None, Some("ghost"))]);
        mock.set_current_match(Some(40));
        mock.set_peers(vec![
            peer(Some(2), Some("luna")),
            peer(Some(3), Some("  rex ")),
            peer(Some(4), Some("   ")),
            peer(Some(1), Some("me")),
        ]);
        let api: Arc<dyn SocialApi> = mock.clone();

        let contacts = Contacts::load(&api, 1, "/assets/").await.unwrap();
        assert_eq!(contacts.match_id, Some(40));
        assert_eq!(contacts.friends.len(), 1);
        assert_eq!(contacts.friends[0].avatar_url, DEFAULT_AVATAR_URL);
        let peers: Vec<_> = contacts.match_peers.iter().map(|c| c.username.as_str()).collect();
        assert_eq!(peers, vec!["luna", "rex"]);

        let all: Vec<_> = contacts.all().iter().map(|c| c.id).collect();
        assert_eq!(all, vec![2, 3]);
        assert_eq!(contacts.find(3).map(|c| c.as_peer().username), Some("rex".to_string()));
        assert!(mock.called_with("accepted_peers", "40"));
    }

    #[tokio::test]
    async fn test_match_failures_mean_no_match() {
        let mock = Arc::new(MockApi::new());
        mock.set_current_match(Some(40));
        mock.fail("accepted_peers");
        let api: Arc<dyn SocialApi> = mock.clone();

        let contacts = Contacts::load(&api, 1, "/assets/").await.unwrap();
        assert!(contacts.match_peers.is_empty());

        mock.fail("current_match_id");
        let contacts = Contacts::load(&api, 1, "/assets/").await.unwrap();
        assert_eq!(contacts.match_id, None);
    }

    #[tokio::test]
    async fn test_friends_failure_is_an_error() {
        let mock = Arc::new(MockApi::new());
        mock.fail("friends_of");
        let api: Arc<dyn SocialApi> = mock.clone();
        assert!(Contacts::load(&api, 1, "/assets/").await.is_err());
    }
}
