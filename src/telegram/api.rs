//! Telegram Bot API Client
//!
//! Thin HTTP implementation of `TelegramClient` over reqwest. Wire shapes
//! live here and never leak past the trait boundary; the admission engine
//! only ever sees the domain types from `traits`.

use super::traits::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Long-poll timeout for getUpdates, in seconds.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Bot API client. Cheap to clone; the update offset is shared.
#[derive(Clone)]
pub struct BotApi {
    http: reqwest::Client,
    base: String,
    token: String,
    offset: Arc<tokio::sync::Mutex<i64>>,
}

impl BotApi {
    pub fn new(token: String) -> Self {
        Self::with_base(token, DEFAULT_API_BASE.to_string())
    }

    /// Point the client at a different API host (tests, local bot servers).
    pub fn with_base(token: String, base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base,
            token,
            offset: Arc::new(tokio::sync::Mutex::new(0)),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> TelegramResult<T> {
        let url = format!("{}/bot{}/{}", self.base, self.token, method);
        let response = self
            .http
            .post(&url)
            .json(&params)
            .send()
            .await
            .map_err(|e| TelegramError::Network(e.to_string()))?;

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| TelegramError::Decode(e.to_string()))?;

        if envelope.ok {
            envelope
                .result
                .ok_or_else(|| TelegramError::Decode(format!("{}: missing result", method)))
        } else {
            Err(TelegramError::Api {
                code: envelope.error_code.unwrap_or(0),
                description: envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            })
        }
    }
}

#[async_trait]
impl TelegramClient for BotApi {
    async fn pending_join_requests(&self, chat: ChatId) -> TelegramResult<Vec<JoinRequest>> {
        let requests: Vec<WireJoinRequest> = self
            .call("getChatJoinRequests", json!({ "chat_id": chat.0 }))
            .await?;
        Ok(requests
            .into_iter()
            .map(|r| JoinRequest {
                chat,
                user: r.from.into_profile(),
            })
            .collect())
    }

    async fn approve_join_request(&self, chat: ChatId, user: UserId) -> TelegramResult<()> {
        let _: bool = self
            .call(
                "approveChatJoinRequest",
                json!({ "chat_id": chat.0, "user_id": user.0 }),
            )
            .await?;
        Ok(())
    }

    async fn decline_join_request(&self, chat: ChatId, user: UserId) -> TelegramResult<()> {
        let _: bool = self
            .call(
                "declineChatJoinRequest",
                json!({ "chat_id": chat.0, "user_id": user.0 }),
            )
            .await?;
        Ok(())
    }

    async fn send_message(&self, chat: ChatId, text: &str) -> TelegramResult<()> {
        let _: serde_json::Value = self
            .call("sendMessage", json!({ "chat_id": chat.0, "text": text }))
            .await?;
        Ok(())
    }

    async fn chat_member_status(
        &self,
        chat: ChatId,
        user: UserId,
    ) -> TelegramResult<MemberStatus> {
        let member: WireChatMember = self
            .call(
                "getChatMember",
                json!({ "chat_id": chat.0, "user_id": user.0 }),
            )
            .await?;
        parse_status(&member.status)
    }

    async fn next_updates(&self) -> TelegramResult<Vec<Update>> {
        let mut offset = self.offset.lock().await;

        let wire: Vec<WireUpdate> = self
            .call(
                "getUpdates",
                json!({
                    "offset": *offset,
                    "timeout": POLL_TIMEOUT_SECS,
                    "allowed_updates": ["message", "chat_member"],
                }),
            )
            .await?;

        let mut updates = Vec::new();
        for raw in wire {
            *offset = (*offset).max(raw.update_id + 1);
            match raw.into_update() {
                Ok(Some(update)) => updates.push(update),
                Ok(None) => {}
                Err(e) => warn!("Skipping undecodable update: {}", e),
            }
        }
        Ok(updates)
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Deserialize)]
struct WireUser {
    id: i64,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    /// Unix seconds, where the platform exposes it. Not part of the stock
    /// Bot API user object; absent means the age check is skipped.
    created_at: Option<i64>,
}

impl WireUser {
    fn into_profile(self) -> UserProfile {
        UserProfile {
            id: UserId(self.id),
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at: self
                .created_at
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        }
    }
}

#[derive(Deserialize)]
struct WireChat {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct WireJoinRequest {
    from: WireUser,
}

#[derive(Deserialize)]
struct WireChatMember {
    status: String,
    user: WireUser,
}

#[derive(Deserialize)]
struct WireChatMemberUpdated {
    chat: WireChat,
    old_chat_member: WireChatMember,
    new_chat_member: WireChatMember,
}

#[derive(Deserialize)]
struct WireMessage {
    chat: WireChat,
    from: Option<WireUser>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct WireUpdate {
    update_id: i64,
    message: Option<WireMessage>,
    chat_member: Option<WireChatMemberUpdated>,
}

impl WireUpdate {
    /// Map a wire update to the domain. Updates we don't consume (stickers,
    /// edits, messages without text) map to `None`.
    fn into_update(self) -> Result<Option<Update>, TelegramError> {
        if let Some(message) = self.message {
            let (Some(from), Some(text)) = (message.from, message.text) else {
                return Ok(None);
            };
            return Ok(Some(Update::Message(IncomingMessage {
                chat: ChatId(message.chat.id),
                chat_kind: parse_chat_kind(&message.chat.kind)?,
                sender: UserId(from.id),
                text,
            })));
        }

        if let Some(member) = self.chat_member {
            return Ok(Some(Update::Member(MemberTransition {
                chat: ChatId(member.chat.id),
                user: UserId(member.new_chat_member.user.id),
                old_status: parse_status(&member.old_chat_member.status)?,
                new_status: parse_status(&member.new_chat_member.status)?,
            })));
        }

        Ok(None)
    }
}

fn parse_status(status: &str) -> TelegramResult<MemberStatus> {
    match status {
        "creator" => Ok(MemberStatus::Creator),
        "administrator" => Ok(MemberStatus::Administrator),
        "member" => Ok(MemberStatus::Member),
        "restricted" => Ok(MemberStatus::Restricted),
        "left" => Ok(MemberStatus::Left),
        "kicked" => Ok(MemberStatus::Kicked),
        other => Err(TelegramError::Decode(format!(
            "unknown member status: {}",
            other
        ))),
    }
}

fn parse_chat_kind(kind: &str) -> TelegramResult<ChatKind> {
    match kind {
        "private" => Ok(ChatKind::Private),
        "group" => Ok(ChatKind::Group),
        "supergroup" => Ok(ChatKind::Supergroup),
        "channel" => Ok(ChatKind::Channel),
        other => Err(TelegramError::Decode(format!("unknown chat kind: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_covers_full_taxonomy() {
        assert_eq!(parse_status("creator").unwrap(), MemberStatus::Creator);
        assert_eq!(parse_status("kicked").unwrap(), MemberStatus::Kicked);
        assert!(parse_status("floating").is_err());
    }

    #[test]
    fn test_message_update_maps_to_domain() {
        let raw: WireUpdate = serde_json::from_value(serde_json::json!({
            "update_id": 10,
            "message": {
                "chat": { "id": -100, "type": "supergroup" },
                "from": { "id": 5, "username": "alice" },
                "text": "/approve_all"
            }
        }))
        .unwrap();

        let update = raw.into_update().unwrap().unwrap();
        match update {
            Update::Message(msg) => {
                assert_eq!(msg.chat, ChatId(-100));
                assert_eq!(msg.sender, UserId(5));
                assert_eq!(msg.chat_kind, ChatKind::Supergroup);
                assert_eq!(msg.text, "/approve_all");
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_chat_member_update_maps_to_transition() {
        let raw: WireUpdate = serde_json::from_value(serde_json::json!({
            "update_id": 11,
            "chat_member": {
                "chat": { "id": -100, "type": "channel" },
                "old_chat_member": { "status": "member", "user": { "id": 7 } },
                "new_chat_member": { "status": "left", "user": { "id": 7 } }
            }
        }))
        .unwrap();

        let update = raw.into_update().unwrap().unwrap();
        match update {
            Update::Member(t) => {
                assert_eq!(t.chat, ChatId(-100));
                assert_eq!(t.user, UserId(7));
                assert_eq!(t.old_status, MemberStatus::Member);
                assert_eq!(t.new_status, MemberStatus::Left);
            }
            other => panic!("expected transition, got {:?}", other),
        }
    }

    #[test]
    fn test_textless_message_is_skipped() {
        let raw: WireUpdate = serde_json::from_value(serde_json::json!({
            "update_id": 12,
            "message": {
                "chat": { "id": -100, "type": "group" },
                "from": { "id": 5 }
            }
        }))
        .unwrap();

        assert!(raw.into_update().unwrap().is_none());
    }

    #[test]
    fn test_profile_conversion_keeps_created_at() {
        let user: WireUser = serde_json::from_value(serde_json::json!({
            "id": 9,
            "first_name": "Ada",
            "created_at": 1_700_000_000
        }))
        .unwrap();

        let profile = user.into_profile();
        assert_eq!(profile.id, UserId(9));
        assert_eq!(
            profile.created_at.unwrap().timestamp(),
            1_700_000_000
        );
    }
}
