//! # Post DTOs
//!
//! Comments, likes and post edits. Like and comment counts come from their
//! own endpoints, separate from the comment list.

use serde::{Deserialize, Serialize};

use crate::utils::lenient_i64;

/// A comment on a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub author_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl CommentDto {
    pub fn resolved_author_id(&self) -> Option<i64> {
        self.user_id.or(self.author_id)
    }
}

/// Response of `GET /api/posts/{id}/comments`: a Spring page or a bare list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommentPage {
    List(Vec<CommentDto>),
    #[serde(rename_all = "camelCase")]
    Page {
        #[serde(default)]
        content: Vec<CommentDto>,
        #[serde(default)]
        total_elements: Option<u64>,
    },
}

impl CommentPage {
    /// Total number of comments on the post: `totalElements` when the server
    /// sent it, else the length of the returned slice.
    pub fn total(&self) -> u64 {
        match self {
            CommentPage::List(items) => items.len() as u64,
            CommentPage::Page {
                content,
                total_elements,
            } => total_elements.unwrap_or(content.len() as u64),
        }
    }

    pub fn into_items(self) -> Vec<CommentDto> {
        match self {
            CommentPage::List(items) => items,
            CommentPage::Page { content, .. } => content,
        }
    }
}

/// Body of comment create and update calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentBody {
    pub content: String,
}

/// Response of `GET /api/posts/{id}/likes/count`: a number or `{count}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LikeCount {
    Plain(u64),
    Wrapped {
        #[serde(default)]
        count: Option<u64>,
    },
}

impl LikeCount {
    pub fn value(&self) -> Option<u64> {
        match self {
            LikeCount::Plain(n) => Some(*n),
            LikeCount::Wrapped { count } => *count,
        }
    }
}

/// Entry of `GET /api/posts/{id}/likes/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeUser {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Body of `PUT /api/posts/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostUpdate {
    pub content: String,
    pub feeling: Option<String>,
    pub location: Option<String>,
    pub caption: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_page_shapes() {
        let page: CommentPage =
            serde_json::from_str(r#"{"content":[{"id":1,"content":"x"}],"totalElements":12}"#).unwrap();
        assert_eq!(page.total(), 12);
        assert_eq!(page.into_items().len(), 1);

        let page: CommentPage = serde_json::from_str(r#"{"content":[{"id":1,"content":"x"}]}"#).unwrap();
        assert_eq!(page.total(), 1);

        let list: CommentPage = serde_json::from_str(r#"[{"id":1},{"id":2}]"#).unwrap();
        assert_eq!(list.total(), 2);
    }

    #[test]
    fn test_like_count_shapes() {
        let plain: LikeCount = serde_json::from_str("4").unwrap();
        assert_eq!(plain.value(), Some(4));
        let wrapped: LikeCount = serde_json::from_str(r#"{"count":5}"#).unwrap();
        assert_eq!(wrapped.value(), Some(5));
        let empty: LikeCount = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(empty.value(), None);
    }

    #[test]
    fn test_comment_author_resolution() {
        let c: CommentDto = serde_json::from_str(r#"{"authorId":3,"content":"hey"}"#).unwrap();
        assert_eq!(c.resolved_author_id(), Some(3));
    }
}
