//! Test doubles: a scripted [`SocialApi`] and a local STOMP broker.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use shared::dto::{
    ChatMessage, CommentDto, CommentPage, CurrentUser, FriendshipStatusDto, LikeUser, PeerDto,
    PostUpdate, ProfileDto, RawNotification, UserDto,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::tungstenite::Message;

use crate::core::error::{AppError, Result};
use crate::core::service::{PageRequest, SocialApi};
use crate::services::stomp::{split_frames, Command, Frame};

#[derive(Default)]
struct State {
    me: Option<CurrentUser>,
    roles: Vec<String>,
    users: HashMap<i64, UserDto>,
    profiles: HashMap<i64, ProfileDto>,
    friends: Vec<PeerDto>,
    friendship_status: Option<String>,
    notifications: Vec<RawNotification>,
    current_match: Option<i64>,
    peers: Vec<PeerDto>,
    history: Vec<ChatMessage>,
    like_count: Option<u64>,
    like_users: Vec<LikeUser>,
    comments: Vec<CommentDto>,
    comment_total: Option<u64>,
    next_comment_id: i64,
}

/// In-memory API whose responses, failures and pauses are set per test.
#[derive(Default)]
pub struct MockApi {
    state: Mutex<State>,
    failures: Mutex<HashMap<&'static str, (u16, String)>>,
    gates: Mutex<HashMap<&'static str, Arc<Notify>>>,
    calls: Mutex<Vec<(&'static str, String)>>,
}

impl MockApi {
    pub fn new() -> Self {
        let mock = Self::default();
        mock.state.lock().next_comment_id = 1000;
        mock
    }

    pub fn set_me(&self, id: i64, username: &str) {
        self.state.lock().me = Some(CurrentUser {
            id,
            username: username.to_string(),
            email: None,
            profile_picture_url: None,
        });
    }

    pub fn set_roles(&self, roles: &[&str]) {
        self.state.lock().roles = roles.iter().map(|r| r.to_string()).collect();
    }

    pub fn add_user(&self, user: UserDto) {
        self.state.lock().users.insert(user.id, user);
    }

    pub fn add_profile(&self, user_id: i64, profile: ProfileDto) {
        self.state.lock().profiles.insert(user_id, profile);
    }

    pub fn set_friends(&self, friends: Vec<PeerDto>) {
        self.state.lock().friends = friends;
    }

    pub fn set_friendship_status(&self, status: Option<&str>) {
        self.state.lock().friendship_status = status.map(str::to_string);
    }

    pub fn set_notifications(&self, notifications: Vec<RawNotification>) {
        self.state.lock().notifications = notifications;
    }

    pub fn set_current_match(&self, match_id: Option<i64>) {
        self.state.lock().current_match = match_id;
    }

    pub fn set_peers(&self, peers: Vec<PeerDto>) {
        self.state.lock().peers = peers;
    }

    pub fn set_history(&self, history: Vec<ChatMessage>) {
        self.state.lock().history = history;
    }

    pub fn set_like_count(&self, count: Option<u64>) {
        self.state.lock().like_count = count;
    }

    pub fn set_like_users(&self, users: Vec<LikeUser>) {
        self.state.lock().like_users = users;
    }

    pub fn set_comments(&self, comments: Vec<CommentDto>, total: Option<u64>) {
        let mut state = self.state.lock();
        state.comments = comments;
        state.comment_total = total;
    }

    /// Make `op` fail with HTTP 500.
    pub fn fail(&self, op: &'static str) {
        self.fail_with(op, 500, "boom");
    }

    pub fn fail_with(&self, op: &'static str, status: u16, message: &str) {
        self.failures.lock().insert(op, (status, message.to_string()));
    }

    pub fn succeed(&self, op: &'static str) {
        self.failures.lock().remove(op);
    }

    /// Make `op` wait until the returned [`Notify`] is signalled.
    pub fn gate(&self, op: &'static str) -> Arc<Notify> {
        self.gates.lock().entry(op).or_insert_with(|| Arc::new(Notify::new())).clone()
    }

    /// Let `op` run straight through again.
    pub fn ungate(&self, op: &'static str) {
        self.gates.lock().remove(op);
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.calls.lock().iter().filter(|(name, _)| *name == op).count()
    }

    pub fn called_with(&self, op: &str, detail: &str) -> bool {
        self.calls.lock().iter().any(|(name, d)| *name == op && d == detail)
    }

    async fn enter(&self, op: &'static str, detail: impl ToString) -> Result<()> {
        self.calls.lock().push((op, detail.to_string()));
        let gate = self.gates.lock().get(op).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.failures.lock().get(op) {
            Some((status, message)) => Err(AppError::Http {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn not_found() -> AppError {
        AppError::Http {
            status: 404,
            message: "Not Found".to_string(),
        }
    }
}

#[async_trait]
impl SocialApi for MockApi {
    async fn login(&self, username: &str, _password: &str) -> Result<()> {
        self.enter("login", username).await
    }

    async fn me(&self) -> Result<CurrentUser> {
        self.enter("me", "").await.map_err(|_| AppError::Unauthenticated)?;
        self.state.lock().me.clone().ok_or(AppError::Unauthenticated)
    }

    async fn roles(&self) -> Result<Vec<String>> {
        self.enter("roles", "").await?;
        Ok(self.state.lock().roles.clone())
    }

    async fn logout(&self) -> Result<()> {
        self.enter("logout", "").await
    }

    async fn forgot_password_start(&self, email: &str) -> Result<()> {
        self.enter("forgot_password_start", email).await
    }

    async fn forgot_password_verify(&self, email: &str, code: &str, new_password: &str) -> Result<()> {
        self.enter("forgot_password_verify", format!("{}|{}|{}", email, code, new_password))
            .await
    }

    async fn get_user(&self, user_id: i64) -> Result<UserDto> {
        self.enter("get_user", user_id).await?;
        self.state.lock().users.get(&user_id).cloned().ok_or_else(Self::not_found)
    }

    async fn get_profile(&self, user_id: i64) -> Result<ProfileDto> {
        self.enter("get_profile", user_id).await?;
        self.state.lock().profiles.get(&user_id).cloned().ok_or_else(Self::not_found)
    }

    async fn friends_of(&self, user_id: i64) -> Result<Vec<PeerDto>> {
        self.enter("friends_of", user_id).await?;
        Ok(self.state.lock().friends.clone())
    }

    async fn friendship_status(&self, user_id: i64) -> Result<FriendshipStatusDto> {
        self.enter("friendship_status", user_id).await?;
        Ok(FriendshipStatusDto {
            status: self.state.lock().friendship_status.clone(),
            id: None,
        })
    }

    async fn create_friendship(&self, friend_id: i64) -> Result<()> {
        self.enter("create_friendship", friend_id).await
    }

    async fn accept_friendship(&self, request_id: i64) -> Result<()> {
        self.enter("accept_friendship", request_id).await
    }

    async fn decline_friendship(&self, request_id: i64) -> Result<()> {
        self.enter("decline_friendship", request_id).await
    }

    async fn delete_friendship(&self, user_id: i64) -> Result<()> {
        self.enter("delete_friendship", user_id).await
    }

    async fn list_notifications(&self) -> Result<Vec<RawNotification>> {
        self.enter("list_notifications", "").await?;
        Ok(self.state.lock().notifications.clone())
    }

    async fn mark_notification_read(&self, notification_id: &str) -> Result<()> {
        self.enter("mark_notification_read", notification_id).await
    }

    async fn current_match_id(&self) -> Result<Option<i64>> {
        self.enter("current_match_id", "").await?;
        Ok(self.state.lock().current_match)
    }

    async fn accepted_peers(&self, match_id: i64) -> Result<Vec<PeerDto>> {
        self.enter("accepted_peers", match_id).await?;
        Ok(self.state.lock().peers.clone())
    }

    async fn accept_match_interest(&self, interest_id: i64) -> Result<()> {
        self.enter("accept_match_interest", interest_id).await
    }

    async fn decline_match_interest(&self, interest_id: i64) -> Result<()> {
        self.enter("decline_match_interest", interest_id).await
    }

    async fn chat_history(&self, user_a: i64, user_b: i64) -> Result<Vec<ChatMessage>> {
        self.enter("chat_history", format!("{}|{}", user_a, user_b)).await?;
        Ok(self.state.lock().history.clone())
    }

    async fn like_post(&self, post_id: i64) -> Result<()> {
        self.enter("like_post", post_id).await?;
        let mut state = self.state.lock();
        state.like_count = Some(state.like_count.unwrap_or(0) + 1);
        Ok(())
    }

    async fn unlike_post(&self, post_id: i64) -> Result<()> {
        self.enter("unlike_post", post_id).await?;
        let mut state = self.state.lock();
        state.like_count = Some(state.like_count.unwrap_or(0).saturating_sub(1));
        Ok(())
    }

    async fn like_count(&self, post_id: i64) -> Result<Option<u64>> {
        self.enter("like_count", post_id).await?;
        Ok(self.state.lock().like_count)
    }

    async fn like_users(&self, post_id: i64) -> Result<Vec<LikeUser>> {
        self.enter("like_users", post_id).await?;
        Ok(self.state.lock().like_users.clone())
    }

    async fn comments(&self, post_id: i64, page: &PageRequest) -> Result<CommentPage> {
        self.enter("comments", format!("{}|{}|{}", post_id, page.page, page.size))
            .await?;
        let state = self.state.lock();
        let content: Vec<CommentDto> = state.comments.iter().take(page.size as usize).cloned().collect();
        Ok(match state.comment_total {
            Some(total) => CommentPage::Page {
                content,
                total_elements: Some(total),
            },
            None => CommentPage::List(content),
        })
    }

    async fn add_comment(&self, post_id: i64, content: &str) -> Result<CommentDto> {
        self.enter("add_comment", format!("{}|{}", post_id, content)).await?;
        let mut state = self.state.lock();
        state.next_comment_id += 1;
        Ok(CommentDto {
            id: Some(state.next_comment_id),
            content: content.to_string(),
            user_id: state.me.as_ref().map(|me| me.id),
            author_username: state.me.as_ref().map(|me| me.username.clone()),
            ..Default::default()
        })
    }

    async fn update_comment(&self, post_id: i64, comment_id: i64, content: &str) -> Result<Option<CommentDto>> {
        self.enter("update_comment", format!("{}|{}|{}", post_id, comment_id, content))
            .await?;
        Ok(None)
    }

    async fn delete_comment(&self, post_id: i64, comment_id: i64) -> Result<()> {
        self.enter("delete_comment", format!("{}|{}", post_id, comment_id)).await
    }

    async fn update_post(&self, post_id: i64, update: &PostUpdate) -> Result<()> {
        self.enter("update_post", format!("{}|{}", post_id, update.content)).await
    }
}

/// A frame the broker received, with the connection it arrived on
/// (numbered from 1) and when.
#[derive(Debug, Clone)]
pub struct Received {
    pub connection: usize,
    pub frame: Frame,
    pub at: Instant,
}

/// STOMP broker on a local port. It answers `CONNECT` with `CONNECTED`,
/// records every client frame, and can cut the first connection right
/// after a given command without a closing handshake.
pub struct StubBroker {
    addr: std::net::SocketAddr,
    frames: mpsc::UnboundedReceiver<Received>,
    cut_at: Arc<Mutex<Option<Instant>>>,
}

impl StubBroker {
    pub async fn start(cut_first_after: Option<Command>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, frames) = mpsc::unbounded_channel();
        let cut_at = Arc::new(Mutex::new(None));

        let cut_marker = cut_at.clone();
        tokio::spawn(async move {
            let mut connection = 0usize;
            while let Ok((stream, _)) = listener.accept().await {
                connection += 1;
                let cut = if connection == 1 { cut_first_after } else { None };
                tokio::spawn(serve(stream, connection, cut, tx.clone(), cut_marker.clone()));
            }
        });

        Self { addr, frames, cut_at }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws/websocket", self.addr)
    }

    pub fn api_base(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// When the first connection was cut, if it was.
    pub fn cut_at(&self) -> Option<Instant> {
        *self.cut_at.lock()
    }

    /// Frames up to and including the next `last`.
    pub async fn until(&mut self, last: Command) -> Vec<Received> {
        let mut seen = Vec::new();
        loop {
            let received = tokio::time::timeout(Duration::from_secs(5), self.frames.recv())
                .await
                .expect("no frame from client within 5s")
                .expect("broker stopped");
            let done = received.frame.command == last;
            seen.push(received);
            if done {
                return seen;
            }
        }
    }
}

pub fn commands(frames: &[Received]) -> Vec<Command> {
    frames.iter().map(|r| r.frame.command).collect()
}

async fn serve(
    stream: TcpStream,
    connection: usize,
    cut_after: Option<Command>,
    tx: mpsc::UnboundedSender<Received>,
    cut_at: Arc<Mutex<Option<Instant>>>,
) {
    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };
    while let Some(Ok(msg)) = ws.next().await {
        let Message::Text(text) = msg else {
            continue;
        };
        for frame in split_frames(&text).into_iter().flatten() {
            let command = frame.command;
            let _ = tx.send(Received {
                connection,
                frame,
                at: Instant::now(),
            });
            if command == Command::Connect {
                let connected = Frame::new(Command::Connected)
                    .header("version", "1.2")
                    .header("heart-beat", "0,0");
                let _ = ws.send(Message::Text(connected.encode())).await;
            }
            if cut_after == Some(command) {
                *cut_at.lock() = Some(Instant::now());
                return;
            }
        }
    }
}
