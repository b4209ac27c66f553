//! Notification classification.
//!
//! A [`RawNotification`] is reduced to a tagged [`NotificationKind`] once,
//! and everything downstream (category, actionability, display text) is
//! derived from the kind rather than from loose field lookups.

use std::fmt;

use shared::dto::RawNotification;

/// Statuses that count as unread and, for match interests, as pending.
const OPEN_STATUSES: [&str; 4] = ["UNREAD", "NEW", "PENDING", "REQUESTED"];

const MATCH_TYPES: [&str; 6] = [
    "MATCH",
    "MATCH_REQUEST",
    "MATCH_REQUEST_INTEREST",
    "MATCH_INTEREST",
    "MATCH_INTEREST_ACCEPTED",
    "MATCH_INTEREST_DECLINED",
];

const CHAT_TYPES: [&str; 3] = ["CHAT", "CHAT_MESSAGE", "MESSAGE"];

/// How a friend request the viewer sent was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FriendOutcome {
    Accepted,
    Declined,
}

impl FriendOutcome {
    fn from_status(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "ACCEPTED" => Some(FriendOutcome::Accepted),
            "DECLINED" | "REJECTED" => Some(FriendOutcome::Declined),
            _ => None,
        }
    }

    /// Free-text fallback for servers that send no outcome field.
    fn from_text(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("accepted") {
            Some(FriendOutcome::Accepted)
        } else if lower.contains("declined") {
            Some(FriendOutcome::Declined)
        } else {
            None
        }
    }
}

/// What a notification is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// Someone wants to be the viewer's friend.
    FriendRequest,
    /// A friend request the viewer sent was answered.
    FriendRequestOutcome(FriendOutcome),
    /// `MATCH_INTEREST` / `MATCH_REQUEST_INTEREST`.
    MatchInterest,
    MatchInterestAccepted,
    MatchInterestDeclined,
    /// Any other match related type, e.g. `MATCH_REQUEST`.
    Match(String),
    ChatMessage,
    Other(String),
}

/// Uppercase, whitespace runs replaced by `_`.
pub fn normalize_type(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

fn is_match_type(normalized: &str) -> bool {
    (normalized.contains("MATCH") && (normalized.contains("INTEREST") || normalized.contains("REQUEST")))
        || MATCH_TYPES.contains(&normalized)
}

impl NotificationKind {
    pub fn of(raw: &RawNotification) -> Self {
        let normalized = normalize_type(raw.raw_type().unwrap_or_default());

        match normalized.as_str() {
            "FRIEND_REQUEST" => {
                let outcome = raw
                    .outcome
                    .as_deref()
                    .and_then(FriendOutcome::from_status)
                    .or_else(|| FriendOutcome::from_status(&raw.status_upper()))
                    .or_else(|| FriendOutcome::from_text(&raw.text()));
                match outcome {
                    Some(outcome) => NotificationKind::FriendRequestOutcome(outcome),
                    None => NotificationKind::FriendRequest,
                }
            }
            "FRIEND_REQUEST_ACCEPTED" => NotificationKind::FriendRequestOutcome(FriendOutcome::Accepted),
            "FRIEND_REQUEST_DECLINED" => NotificationKind::FriendRequestOutcome(FriendOutcome::Declined),
            "MATCH_INTEREST" | "MATCH_REQUEST_INTEREST" => NotificationKind::MatchInterest,
            "MATCH_INTEREST_ACCEPTED" => NotificationKind::MatchInterestAccepted,
            "MATCH_INTEREST_DECLINED" => NotificationKind::MatchInterestDeclined,
            t if is_match_type(t) => NotificationKind::Match(t.to_string()),
            t if CHAT_TYPES.contains(&t) => NotificationKind::ChatMessage,
            other => NotificationKind::Other(other.to_string()),
        }
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            NotificationKind::FriendRequest => Some(Category::FriendRequestIncoming),
            NotificationKind::FriendRequestOutcome(_) => Some(Category::FriendRequestOutcome),
            NotificationKind::MatchInterest
            | NotificationKind::MatchInterestAccepted
            | NotificationKind::MatchInterestDeclined
            | NotificationKind::Match(_) => Some(Category::MatchInterest),
            NotificationKind::ChatMessage => Some(Category::ChatMessage),
            NotificationKind::Other(_) => None,
        }
    }
}

/// The four collections the aggregator publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    FriendRequestIncoming,
    FriendRequestOutcome,
    MatchInterest,
    ChatMessage,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::FriendRequestIncoming,
        Category::FriendRequestOutcome,
        Category::MatchInterest,
        Category::ChatMessage,
    ];

    fn index(self) -> usize {
        match self {
            Category::FriendRequestIncoming => 0,
            Category::FriendRequestOutcome => 1,
            Category::MatchInterest => 2,
            Category::ChatMessage => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::FriendRequestIncoming => "friend_requests",
            Category::FriendRequestOutcome => "friend_outcomes",
            Category::MatchInterest => "match_interests",
            Category::ChatMessage => "chat_messages",
        };
        f.write_str(name)
    }
}

/// Which categories an aggregator tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySet([bool; 4]);

impl CategorySet {
    pub fn all() -> Self {
        Self([true; 4])
    }

    /// Friend requests and their outcomes only.
    pub fn friends() -> Self {
        Self::of(&[Category::FriendRequestIncoming, Category::FriendRequestOutcome])
    }

    /// Match interests and chat messages only.
    pub fn match_and_chat() -> Self {
        Self::of(&[Category::MatchInterest, Category::ChatMessage])
    }

    pub fn of(categories: &[Category]) -> Self {
        let mut set = [false; 4];
        for category in categories {
            set[category.index()] = true;
        }
        Self(set)
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0[category.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::all()
    }
}

/// Badge counts per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub friend_requests: usize,
    pub friend_outcomes: usize,
    pub match_interests: usize,
    pub chat_messages: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::FriendRequestIncoming => self.friend_requests,
            Category::FriendRequestOutcome => self.friend_outcomes,
            Category::MatchInterest => self.match_interests,
            Category::ChatMessage => self.chat_messages,
        }
    }

    pub(crate) fn set(&mut self, category: Category, count: usize) {
        match category {
            Category::FriendRequestIncoming => self.friend_requests = count,
            Category::FriendRequestOutcome => self.friend_outcomes = count,
            Category::MatchInterest => self.match_interests = count,
            Category::ChatMessage => self.chat_messages = count,
        }
    }

    pub fn total(&self) -> usize {
        self.friend_requests + self.friend_outcomes + self.match_interests + self.chat_messages
    }
}

/// Unread test, first rule that applies wins: the `read` flag; a
/// `status`/`state` value; a `readAt` field that is present; else unread.
pub fn is_unread(raw: &RawNotification) -> bool {
    if let Some(read) = raw.read {
        return !read;
    }
    let status = raw.status_upper();
    if !status.is_empty() {
        return OPEN_STATUSES.contains(&status.as_str());
    }
    if let Some(read_at) = &raw.read_at {
        return read_at.is_none();
    }
    true
}

/// A missing status counts as pending.
pub fn is_pending(raw: &RawNotification) -> bool {
    let status = raw.status_upper();
    status.is_empty() || OPEN_STATUSES.contains(&status.as_str())
}

/// Whether the viewer is on the receiving end: the recipient id when
/// present, else anyone but the requester.
pub fn viewer_is_recipient(raw: &RawNotification, viewer: i64) -> bool {
    match raw.resolved_recipient_id() {
        Some(recipient) => recipient == viewer,
        None => raw.resolved_requester_id() != Some(viewer),
    }
}

/// Whether the viewer can accept or decline this notification.
pub fn is_actionable(kind: &NotificationKind, raw: &RawNotification, viewer: Option<i64>) -> bool {
    match kind {
        NotificationKind::FriendRequest => true,
        NotificationKind::MatchInterest => match viewer {
            Some(viewer) => viewer_is_recipient(raw, viewer) && is_pending(raw),
            None => false,
        },
        _ => false,
    }
}

/// Text shown after the actor's name.
pub fn describe(kind: &NotificationKind, raw: &RawNotification, viewer: Option<i64>) -> &'static str {
    match kind {
        NotificationKind::MatchInterest => {
            let recipient = viewer.map(|v| viewer_is_recipient(raw, v)).unwrap_or(true);
            if recipient {
                "is interested in your match request"
            } else {
                "you expressed interest"
            }
        }
        NotificationKind::MatchInterestAccepted => "accepted your match request",
        NotificationKind::MatchInterestDeclined => "declined your match request",
        NotificationKind::FriendRequest => "sent you a friend request",
        NotificationKind::FriendRequestOutcome(FriendOutcome::Accepted) => "accepted your friend request",
        NotificationKind::FriendRequestOutcome(FriendOutcome::Declined) => "declined your friend request",
        NotificationKind::ChatMessage => "sent you a message",
        NotificationKind::Match(_) | NotificationKind::Other(_) => "sent you a notification",
    }
}
