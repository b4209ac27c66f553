//! # Actor Cache
//!
//! Notifications and comments reference the user who triggered them only by
//! id. [`ActorResolver`] turns those ids into displayable [`Actor`]s and
//! memoizes the result in a size-bounded FIFO cache shared by every
//! component of a session.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use tracing::debug;

use crate::core::SocialApi;
use crate::utils::avatar::{resolve_avatar_src, DEFAULT_AVATAR_URL};

/// Key/value map bounded to a fixed capacity. Once full, inserting a new key
/// evicts the oldest-inserted one. Entries are immutable once inserted.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    entries: HashMap<K, V>,
    order: VecDeque<K>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V> BoundedCache<K, V> {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert a new entry. Returns `false` and leaves the cache untouched if
    /// the key is already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Display identity of a user referenced by a notification or comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Option<i64>,
    pub username: String,
    pub avatar_url: String,
}

impl Actor {
    /// Used when the record names no actor at all.
    pub fn anonymous() -> Self {
        Self {
            id: None,
            username: "User".to_string(),
            avatar_url: DEFAULT_AVATAR_URL.to_string(),
        }
    }

    /// Used when the user lookup failed.
    pub fn fallback(id: i64) -> Self {
        Self {
            id: Some(id),
            username: format!("user#{}", id),
            avatar_url: DEFAULT_AVATAR_URL.to_string(),
        }
    }
}

/// Resolves actor ids through the shared cache, fetching on a miss.
#[derive(Clone)]
pub struct ActorResolver {
    api: Arc<dyn SocialApi>,
    cache: Arc<Mutex<BoundedCache<i64, Actor>>>,
    avatar_prefix: String,
}

impl ActorResolver {
    pub fn new(api: Arc<dyn SocialApi>, capacity: usize, avatar_prefix: impl Into<String>) -> Self {
        Self {
            api,
            cache: Arc::new(Mutex::new(BoundedCache::new(capacity))),
            avatar_prefix: avatar_prefix.into(),
        }
    }

    pub fn cached(&self, id: i64) -> Option<Actor> {
        self.cache.lock().get(&id).cloned()
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Resolve one actor. Never fails: a missing id yields
    /// [`Actor::anonymous`], a failed lookup yields [`Actor::fallback`], and
    /// the fallback is cached like any other result.
    pub async fn resolve(&self, actor_id: Option<i64>) -> Actor {
        let Some(id) = actor_id else {
            return Actor::anonymous();
        };
        if let Some(hit) = self.cached(id) {
            return hit;
        }

        let (user, profile) = tokio::join!(self.api.get_user(id), self.api.get_profile(id));
        let actor = match user {
            Ok(user) => {
                let profile_picture = profile.ok().and_then(|p| p.url_profile_picture);
                let picture = user
                    .profile_picture_url
                    .filter(|url| !url.trim().is_empty())
                    .or(profile_picture);
                Actor {
                    id: Some(id),
                    username: user.username,
                    avatar_url: resolve_avatar_src(picture.as_deref(), &self.avatar_prefix),
                }
            }
            Err(e) => {
                debug!(actor_id = id, error = %e, "Actor lookup failed, using fallback");
                Actor::fallback(id)
            }
        };

        let mut cache = self.cache.lock();
        if !cache.insert(id, actor.clone()) {
            // A concurrent lookup got there first; its entry stands.
            if let Some(existing) = cache.get(&id) {
                return existing.clone();
            }
        }
        actor
    }

    /// Resolve many actors concurrently, preserving input order.
    pub async fn enrich<I>(&self, actor_ids: I) -> Vec<Actor>
    where
        I: IntoIterator<Item = Option<i64>>,
    {
        join_all(actor_ids.into_iter().map(|id| self.resolve(id))).await
    }
}
