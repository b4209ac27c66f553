//! # Post Interaction Endpoints
//!
//! Likes, like counts and comments of a single post.

use shared::dto::{CommentBody, CommentDto, CommentPage, LikeCount, LikeUser, PostUpdate};

use super::client::{decode, ApiClient};
use crate::core::error::Result;
use crate::core::service::PageRequest;

pub async fn like_post(client: &ApiClient, post_id: i64) -> Result<()> {
    client
        .send_empty(client.client.post(client.url(&format!("/api/posts/{}/like", post_id))))
        .await
}

pub async fn unlike_post(client: &ApiClient, post_id: i64) -> Result<()> {
    client
        .send_empty(client.client.delete(client.url(&format!("/api/posts/{}/like", post_id))))
        .await
}

/// Authoritative like count; `None` when the server sent an empty wrapper.
pub async fn like_count(client: &ApiClient, post_id: i64) -> Result<Option<u64>> {
    let count: LikeCount = client
        .get_json(&format!("/api/posts/{}/likes/count", post_id))
        .await?;
    Ok(count.value())
}

pub async fn like_users(client: &ApiClient, post_id: i64) -> Result<Vec<LikeUser>> {
    client.get_json(&format!("/api/posts/{}/likes/users", post_id)).await
}

pub async fn comments(client: &ApiClient, post_id: i64, page: &PageRequest) -> Result<CommentPage> {
    let mut query = vec![
        ("page", page.page.to_string()),
        ("size", page.size.to_string()),
    ];
    if let Some(sort) = &page.sort {
        query.push(("sort", sort.clone()));
    }

    let response = client
        .execute(
            client
                .client
                .get(client.url(&format!("/api/posts/{}/comments", post_id)))
                .query(&query),
        )
        .await?;
    decode(response).await
}

pub async fn add_comment(client: &ApiClient, post_id: i64, content: &str) -> Result<CommentDto> {
    let body = CommentBody {
        content: content.to_string(),
    };
    let response = client
        .execute(
            client
                .client
                .post(client.url(&format!("/api/posts/{}/comments", post_id)))
                .json(&body),
        )
        .await?;
    decode(response).await
}

/// Update a comment. Some server versions answer with an empty body.
pub async fn update_comment(
    client: &ApiClient,
    post_id: i64,
    comment_id: i64,
    content: &str,
) -> Result<Option<CommentDto>> {
    let body = CommentBody {
        content: content.to_string(),
    };
    let response = client
        .execute(
            client
                .client
                .put(client.url(&format!("/api/posts/{}/comments/{}", post_id, comment_id)))
                .json(&body),
        )
        .await?;

    let text = response.text().await.unwrap_or_default();
    if text.trim().is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_str::<CommentDto>(&text).ok())
}

pub async fn delete_comment(client: &ApiClient, post_id: i64, comment_id: i64) -> Result<()> {
    client
        .send_empty(
            client
                .client
                .delete(client.url(&format!("/api/posts/{}/comments/{}", post_id, comment_id))),
        )
        .await
}

pub async fn update_post(client: &ApiClient, post_id: i64, update: &PostUpdate) -> Result<()> {
    client
        .send_empty(client.client.put(client.url(&format!("/api/posts/{}", post_id))).json(update))
        .await
}
