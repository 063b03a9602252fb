//! Telegram Client Trait Abstractions
//!
//! These traits enable full test coverage via MockTelegramClient: every
//! admission decision can be exercised without touching the Bot API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Telegram user identifier (stable integer id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Telegram chat identifier (channel, group, or private chat)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User profile as supplied with a join request or update.
///
/// Read-only input to the admission engine; not owned or stored by it.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Account creation time, when the platform exposes it.
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Best available label for log lines: username, else first name, else id.
    pub fn label(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.first_name.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// A pending request to join a chat.
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub chat: ChatId,
    pub user: UserProfile,
}

/// Chat membership status, per the Bot API `ChatMember` taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl MemberStatus {
    /// Active membership states (`member`, `administrator`, `creator`).
    pub fn is_active(self) -> bool {
        matches!(
            self,
            MemberStatus::Member | MemberStatus::Administrator | MemberStatus::Creator
        )
    }

    /// Departed states (`left`, `kicked`).
    pub fn is_departed(self) -> bool {
        matches!(self, MemberStatus::Left | MemberStatus::Kicked)
    }

    /// States allowed to issue operator commands.
    pub fn is_privileged(self) -> bool {
        matches!(self, MemberStatus::Administrator | MemberStatus::Creator)
    }
}

/// A chat-member status transition delivered by the platform.
#[derive(Debug, Clone)]
pub struct MemberTransition {
    pub chat: ChatId,
    pub user: UserId,
    pub old_status: MemberStatus,
    pub new_status: MemberStatus,
}

/// Kind of chat a message arrived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    /// Operator commands are only honored in group-like chats.
    pub fn accepts_commands(self) -> bool {
        matches!(
            self,
            ChatKind::Group | ChatKind::Supergroup | ChatKind::Channel
        )
    }
}

/// An incoming text message.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat: ChatId,
    pub chat_kind: ChatKind,
    pub sender: UserId,
    pub text: String,
}

/// Update variants the bot consumes from the platform.
#[derive(Debug, Clone)]
pub enum Update {
    Message(IncomingMessage),
    Member(MemberTransition),
}

/// Result type for Telegram operations
pub type TelegramResult<T> = Result<T, TelegramError>;

/// Telegram client errors
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Telegram client abstraction.
///
/// Implemented by `BotApi` against the real Bot API and by
/// `MockTelegramClient` in tests. All calls are fire-and-forget from the
/// admission engine's point of view: failures are logged, never retried.
#[async_trait]
pub trait TelegramClient: Clone + Send + Sync + 'static {
    /// Fetch the pending join requests for a chat.
    async fn pending_join_requests(&self, chat: ChatId) -> TelegramResult<Vec<JoinRequest>>;

    /// Approve a pending join request.
    async fn approve_join_request(&self, chat: ChatId, user: UserId) -> TelegramResult<()>;

    /// Decline a pending join request.
    async fn decline_join_request(&self, chat: ChatId, user: UserId) -> TelegramResult<()>;

    /// Send a text message to a chat.
    async fn send_message(&self, chat: ChatId, text: &str) -> TelegramResult<()>;

    /// Look up a user's membership status in a chat.
    async fn chat_member_status(&self, chat: ChatId, user: UserId)
        -> TelegramResult<MemberStatus>;

    /// Block until the next batch of updates arrives.
    async fn next_updates(&self) -> TelegramResult<Vec<Update>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_and_departed_are_disjoint() {
        let all = [
            MemberStatus::Creator,
            MemberStatus::Administrator,
            MemberStatus::Member,
            MemberStatus::Restricted,
            MemberStatus::Left,
            MemberStatus::Kicked,
        ];
        for status in all {
            assert!(!(status.is_active() && status.is_departed()));
        }
        assert!(!MemberStatus::Restricted.is_active());
        assert!(!MemberStatus::Restricted.is_departed());
    }

    #[test]
    fn test_label_prefers_username() {
        let profile = UserProfile {
            id: UserId(7),
            username: Some("alice".to_string()),
            first_name: Some("Alice".to_string()),
            last_name: None,
            created_at: None,
        };
        assert_eq!(profile.label(), "alice");
    }

    #[test]
    fn test_label_falls_back_to_id() {
        let profile = UserProfile {
            id: UserId(7),
            username: None,
            first_name: None,
            last_name: None,
            created_at: None,
        };
        assert_eq!(profile.label(), "7");
    }
}
