//! # Post Interaction
//!
//! Like and comment state for one post in the feed. Every mutation is
//! applied locally first and undone exactly if the server call fails.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use shared::dto::{CommentDto, PostUpdate};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::error::{AppError, Result};
use crate::core::service::PageRequest;
use crate::core::SocialApi;
use crate::sync::actor_cache::{Actor, ActorResolver};
use crate::sync::friendship::BusyGuard;
use crate::utils::validation::validate_comment;

/// Number of comments fetched when the comment list is opened.
pub const COMMENT_PAGE_SIZE: u32 = 20;

/// What the feed already knows about a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostSummary {
    pub id: i64,
    pub author_id: Option<i64>,
    pub like_count: u64,
    pub comment_count: u64,
}

/// A comment together with its resolved author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    /// Local handle, stable across the optimistic and confirmed versions.
    pub key: u64,
    pub comment: CommentDto,
    pub author: Actor,
}

/// Snapshot of a post's interaction state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostState {
    pub liked: bool,
    pub like_count: u64,
    pub comment_count: u64,
    pub comments: Vec<CommentView>,
    pub comments_loaded: bool,
}

pub struct PostInteraction {
    api: Arc<dyn SocialApi>,
    actors: ActorResolver,
    viewer: Option<i64>,
    post_id: i64,
    author_id: Option<i64>,
    state: RwLock<PostState>,
    like_busy: AtomicBool,
    next_key: AtomicU64,
    cancel: CancellationToken,
}

impl PostInteraction {
    pub fn new(
        api: Arc<dyn SocialApi>,
        actors: ActorResolver,
        viewer: Option<i64>,
        post: PostSummary,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api,
            actors,
            viewer,
            post_id: post.id,
            author_id: post.author_id,
            state: RwLock::new(PostState {
                like_count: post.like_count,
                comment_count: post.comment_count,
                ..PostState::default()
            }),
            like_busy: AtomicBool::new(false),
            next_key: AtomicU64::new(1),
            cancel,
        }
    }

    pub fn post_id(&self) -> i64 {
        self.post_id
    }

    /// The post's author, through the shared actor cache.
    pub async fn author(&self) -> Actor {
        self.actors.resolve(self.author_id).await
    }

    pub fn state(&self) -> PostState {
        self.state.read().clone()
    }

    pub fn is_like_busy(&self) -> bool {
        self.like_busy.load(Ordering::SeqCst)
    }

    /// Apply a change unless the post's scope is gone.
    fn commit(&self, change: impl FnOnce(&mut PostState)) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        change(&mut self.state.write());
        true
    }

    /// Whether the viewer liked the post, and the like count. Failures leave
    /// the state untouched.
    pub async fn load_like_state(&self) {
        let (users, count) = tokio::join!(self.api.like_users(self.post_id), self.api.like_count(self.post_id));

        let liked = match users {
            Ok(users) => self
                .viewer
                .map(|viewer| users.iter().any(|u| u.id == Some(viewer))),
            Err(e) => {
                debug!(post_id = self.post_id, error = %e, "Like users unavailable");
                None
            }
        };
        let count = match count {
            Ok(count) => count,
            Err(e) => {
                debug!(post_id = self.post_id, error = %e, "Like count unavailable");
                None
            }
        };

        self.commit(|state| {
            if let Some(liked) = liked {
                state.liked = liked;
            }
            if let Some(count) = count {
                state.like_count = count;
            }
        });
    }

    /// Fetch the comment total without loading the list.
    pub async fn refresh_comment_count(&self) {
        match self.api.comments(self.post_id, &PageRequest::count_only()).await {
            Ok(page) => {
                let total = page.total();
                self.commit(|state| state.comment_count = total);
            }
            Err(e) => debug!(post_id = self.post_id, error = %e, "Comment count unavailable"),
        }
    }

    /// Load the newest comments, oldest first, with their authors.
    pub async fn load_comments(&self) -> Result<usize> {
        let page = self
            .api
            .comments(self.post_id, &PageRequest::newest(COMMENT_PAGE_SIZE))
            .await
            .map_err(|e| {
                warn!(post_id = self.post_id, error = %e, "Failed to load comments");
                e
            })?;

        let mut comments = page.into_items();
        comments.reverse();
        let authors = self
            .actors
            .enrich(comments.iter().map(CommentDto::resolved_author_id))
            .await;

        let views: Vec<CommentView> = comments
            .into_iter()
            .zip(authors)
            .map(|(comment, author)| self.view(comment, author))
            .collect();
        let count = views.len();

        if !self.commit(|state| {
            state.comments = views;
            state.comments_loaded = true;
        }) {
            return Err(AppError::Cancelled);
        }
        Ok(count)
    }

    /// Like or unlike. Only one toggle runs at a time; the count is replaced
    /// by the server's value afterwards. On failure both values go back to
    /// exactly what they were.
    pub async fn toggle_like(&self) -> Result<PostState> {
        let _busy = BusyGuard::acquire(&self.like_busy)?;

        let (previous_liked, previous_count) = {
            let mut state = self.state.write();
            let snapshot = (state.liked, state.like_count);
            state.liked = !snapshot.0;
            state.like_count = if snapshot.0 {
                snapshot.1.saturating_sub(1)
            } else {
                snapshot.1 + 1
            };
            snapshot
        };

        let result = self.send_like(!previous_liked).await;
        match &result {
            Ok(server_count) => {
                self.commit(|state| {
                    if let Some(count) = server_count {
                        state.like_count = *count;
                    }
                });
            }
            Err(e) => {
                warn!(post_id = self.post_id, error = %e, "Like toggle failed, restoring");
                self.commit(|state| {
                    state.liked = previous_liked;
                    state.like_count = previous_count;
                });
            }
        }

        result.map(|_| self.state())
    }

    async fn send_like(&self, like: bool) -> Result<Option<u64>> {
        if like {
            self.api.like_post(self.post_id).await?;
        } else {
            self.api.unlike_post(self.post_id).await?;
        }
        self.api.like_count(self.post_id).await
    }

    /// Append a comment; the server's copy replaces the local one.
    pub async fn add_comment(&self, content: &str) -> Result<CommentView> {
        validate_comment(content).into_result()?;
        let content = content.trim();

        let author = self.actors.resolve(self.viewer).await;
        let pending = self.view(
            CommentDto {
                content: content.to_string(),
                user_id: self.viewer,
                ..CommentDto::default()
            },
            author.clone(),
        );
        let key = pending.key;
        self.commit(|state| {
            state.comments.push(pending);
            state.comment_count += 1;
        });

        match self.api.add_comment(self.post_id, content).await {
            Ok(saved) => {
                let view = CommentView {
                    key,
                    comment: saved,
                    author,
                };
                let stored = view.clone();
                self.commit(|state| {
                    if let Some(slot) = state.comments.iter_mut().find(|c| c.key == key) {
                        *slot = stored;
                    }
                });
                Ok(view)
            }
            Err(e) => {
                warn!(post_id = self.post_id, error = %e, "Adding comment failed, restoring");
                self.commit(|state| {
                    let before = state.comments.len();
                    state.comments.retain(|c| c.key != key);
                    if state.comments.len() != before {
                        state.comment_count = state.comment_count.saturating_sub(1);
                    }
                });
                Err(e)
            }
        }
    }

    /// Remove a comment by server id.
    pub async fn delete_comment(&self, comment_id: i64) -> Result<()> {
        let removed = {
            let mut state = self.state.write();
            let index = state
                .comments
                .iter()
                .position(|c| c.comment.id == Some(comment_id))
                .ok_or_else(|| AppError::Validation(format!("Unknown comment {}", comment_id)))?;
            let removed = state.comments.remove(index);
            state.comment_count = state.comment_count.saturating_sub(1);
            (index, removed)
        };

        if let Err(e) = self.api.delete_comment(self.post_id, comment_id).await {
            warn!(post_id = self.post_id, comment_id, error = %e, "Deleting comment failed, restoring");
            let (index, view) = removed;
            self.commit(|state| {
                let index = index.min(state.comments.len());
                state.comments.insert(index, view);
                state.comment_count += 1;
            });
            return Err(e);
        }
        Ok(())
    }

    /// Change a comment's text in place.
    pub async fn update_comment(&self, comment_id: i64, content: &str) -> Result<CommentView> {
        validate_comment(content).into_result()?;
        let content = content.trim();

        let previous = {
            let mut state = self.state.write();
            let slot = state
                .comments
                .iter_mut()
                .find(|c| c.comment.id == Some(comment_id))
                .ok_or_else(|| AppError::Validation(format!("Unknown comment {}", comment_id)))?;
            let previous = slot.comment.clone();
            slot.comment.content = content.to_string();
            previous
        };

        match self.api.update_comment(self.post_id, comment_id, content).await {
            Ok(echo) => {
                let mut updated = None;
                self.commit(|state| {
                    if let Some(slot) = state.comments.iter_mut().find(|c| c.comment.id == Some(comment_id)) {
                        if let Some(echo) = echo {
                            slot.comment = echo;
                        }
                        updated = Some(slot.clone());
                    }
                });
                updated.ok_or(AppError::Cancelled)
            }
            Err(e) => {
                warn!(post_id = self.post_id, comment_id, error = %e, "Updating comment failed, restoring");
                self.commit(|state| {
                    if let Some(slot) = state.comments.iter_mut().find(|c| c.comment.id == Some(comment_id)) {
                        slot.comment = previous;
                    }
                });
                Err(e)
            }
        }
    }

    /// Send an edited version of the post itself.
    pub async fn update_post(&self, update: &PostUpdate) -> Result<()> {
        if update.content.trim().is_empty() {
            return Err(AppError::Validation("Post content cannot be empty".to_string()));
        }
        self.api.update_post(self.post_id, update).await.map_err(|e| {
            warn!(post_id = self.post_id, error = %e, "Updating post failed");
            e
        })
    }

    fn view(&self, comment: CommentDto, author: Actor) -> CommentView {
        CommentView {
            key: self.next_key.fetch_add(1, Ordering::Relaxed),
            comment,
            author,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;
    use shared::dto::{LikeUser, UserDto};

    fn post(mock: &Arc<MockApi>, like_count: u64, comment_count: u64) -> PostInteraction {
        PostInteraction::new(
            mock.clone(),
            ActorResolver::new(mock.clone(), 20, "/assets/"),
            Some(1),
            PostSummary {
                id: 5,
                author_id: Some(2),
                like_count,
                comment_count,
            },
            CancellationToken::new(),
        )
    }

    fn comment(id: i64, content: &str) -> CommentDto {
        CommentDto {
            id: Some(id),
            content: content.into(),
            user_id: Some(2),
            ..CommentDto::default()
        }
    }

    #[tokio::test]
    async fn test_toggle_like_failure_restores_exactly() {
        let mock = Arc::new(MockApi::new());
        mock.fail("like_post");
        let p = post(&mock, 3, 0);

        assert!(p.toggle_like().await.is_err());
        let state = p.state();
        assert_eq!(state.like_count, 3);
        assert!(!state.liked);
        assert!(!p.is_like_busy());
    }

    #[tokio::test]
    async fn test_toggle_like_refetch_failure_also_restores() {
        let mock = Arc::new(MockApi::new());
        mock.set_like_count(Some(4));
        mock.set_like_users(vec![LikeUser {
            id: Some(1),
            username: Some("me".into()),
        }]);
        let p = post(&mock, 0, 0);
        p.load_like_state().await;
        assert_eq!(p.state().like_count, 4);
        assert!(p.state().liked);

        mock.fail("like_count");
        assert!(p.toggle_like().await.is_err());
        assert_eq!((p.state().liked, p.state().like_count), (true, 4));
    }

    #[tokio::test]
    async fn test_toggle_like_uses_server_count() {
        let mock = Arc::new(MockApi::new());
        mock.set_like_count(Some(10));
        let p = post(&mock, 3, 0);

        let state = p.toggle_like().await.unwrap();
        assert!(state.liked);
        // The server said 11, not the optimistic 4.
        assert_eq!(state.like_count, 11);

        let state = p.toggle_like().await.unwrap();
        assert!(!state.liked);
        assert_eq!(state.like_count, 10);
    }

    #[tokio::test]
    async fn test_toggle_like_is_single_flight() {
        let mock = Arc::new(MockApi::new());
        let gate = mock.gate("like_post");
        let p = Arc::new(post(&mock, 0, 0));

        let first = {
            let p = p.clone();
            tokio::spawn(async move { p.toggle_like().await })
        };
        while mock.call_count("like_post") == 0 {
            tokio::task::yield_now().await;
        }
        assert!(p.is_like_busy());
        assert!(matches!(p.toggle_like().await, Err(AppError::Busy)));
        assert_eq!(p.state().like_count, 1);

        gate.notify_one();
        first.await.unwrap().unwrap();
        assert!(!p.is_like_busy());
        assert_eq!(mock.call_count("like_post"), 1);
    }

    #[tokio::test]
    async fn test_abandoned_toggle_releases_like() {
        let mock = Arc::new(MockApi::new());
        mock.gate("like_post");
        let p = post(&mock, 0, 0);

        let abandoned = tokio::time::timeout(std::time::Duration::from_millis(20), p.toggle_like()).await;
        assert!(abandoned.is_err());
        assert_eq!(mock.call_count("like_post"), 1);
        assert!(!p.is_like_busy());

        mock.ungate("like_post");
        mock.set_like_count(Some(0));
        let state = p.toggle_like().await.unwrap();
        assert!(!state.liked);
        assert_eq!(state.like_count, 0);
    }

    #[tokio::test]
    async fn test_unlike_floors_at_zero() {
        let mock = Arc::new(MockApi::new());
        mock.set_like_users(vec![LikeUser {
            id: Some(1),
            username: None,
        }]);
        mock.set_like_count(None);
        let p = post(&mock, 0, 0);
        p.load_like_state().await;
        assert!(p.state().liked);

        let gate = mock.gate("unlike_post");
        let p = Arc::new(p);
        let task = {
            let p = p.clone();
            tokio::spawn(async move { p.toggle_like().await })
        };
        while mock.call_count("unlike_post") == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(p.state().like_count, 0);
        gate.notify_one();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_comment_count_and_list() {
        let mock = Arc::new(MockApi::new());
        mock.add_user(UserDto {
            id: 2,
            username: "luna".into(),
            profile_picture_url: None,
        });
        mock.set_comments(vec![comment(3, "newest"), comment(2, "middle"), comment(1, "oldest")], Some(42));
        let p = post(&mock, 0, 0);

        p.refresh_comment_count().await;
        assert_eq!(p.state().comment_count, 42);
        assert!(mock.called_with("comments", "5|0|1"));

        assert_eq!(p.load_comments().await.unwrap(), 3);
        let state = p.state();
        let contents: Vec<_> = state.comments.iter().map(|c| c.comment.content.as_str()).collect();
        assert_eq!(contents, vec!["oldest", "middle", "newest"]);
        assert_eq!(state.comments[0].author.username, "luna");
        assert_eq!(p.author().await.username, "luna");
        assert!(mock.called_with("comments", "5|0|20"));

        // Without totalElements the list length counts.
        mock.set_comments(vec![comment(1, "only")], None);
        p.refresh_comment_count().await;
        assert_eq!(p.state().comment_count, 1);
    }

    #[tokio::test]
    async fn test_comment_mutations_move_in_lock_step() {
        let mock = Arc::new(MockApi::new());
        mock.set_comments(vec![comment(2, "b"), comment(1, "a")], Some(2));
        let p = post(&mock, 0, 2);
        p.load_comments().await.unwrap();

        let added = p.add_comment("  hello  ").await.unwrap();
        assert_eq!(added.comment.content, "hello");
        assert_eq!(added.comment.id, Some(1001));
        assert_eq!(p.state().comment_count, 3);
        assert_eq!(p.state().comments.len(), 3);

        p.update_comment(1, "a2").await.unwrap();
        assert_eq!(p.state().comments[0].comment.content, "a2");

        p.delete_comment(2).await.unwrap();
        let state = p.state();
        assert_eq!(state.comment_count, 2);
        assert!(state.comments.iter().all(|c| c.comment.id != Some(2)));
    }

    #[tokio::test]
    async fn test_comment_failures_roll_back() {
        let mock = Arc::new(MockApi::new());
        mock.set_comments(vec![comment(2, "b"), comment(1, "a")], Some(2));
        let p = post(&mock, 0, 2);
        p.load_comments().await.unwrap();
        let before = p.state();

        mock.fail("add_comment");
        mock.fail("delete_comment");
        mock.fail("update_comment");

        assert!(p.add_comment("x").await.is_err());
        assert!(p.delete_comment(1).await.is_err());
        assert!(p.update_comment(2, "changed").await.is_err());
        assert_eq!(p.state(), before);

        assert!(matches!(p.add_comment("   ").await, Err(AppError::Validation(_))));
        assert!(matches!(p.delete_comment(99).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_cancelled_scope_discards_results() {
        let mock = Arc::new(MockApi::new());
        mock.set_like_count(Some(9));
        let cancel = CancellationToken::new();
        let p = PostInteraction::new(
            mock.clone(),
            ActorResolver::new(mock.clone(), 20, "/assets/"),
            Some(1),
            PostSummary {
                id: 5,
                ..PostSummary::default()
            },
            cancel.clone(),
        );
        cancel.cancel();
        p.load_like_state().await;
        assert_eq!(p.state().like_count, 0);
    }
}
