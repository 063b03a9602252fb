//! Mock Telegram Client for Testing
//!
//! Provides MockTelegramClient so the admission engine can be exercised
//! without the real Bot API: seed pending requests, inject per-chat fetch
//! failures, then assert on recorded approve/decline/send calls.

use super::traits::*;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Mock Telegram client for testing
#[derive(Clone)]
pub struct MockTelegramClient {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    pending: HashMap<ChatId, Vec<JoinRequest>>,
    failing_fetches: HashSet<ChatId>,
    failing_approvals: HashSet<ChatId>,
    member_status: HashMap<(ChatId, UserId), MemberStatus>,
    approved: Vec<(ChatId, UserId)>,
    declined: Vec<(ChatId, UserId)>,
    sent_messages: Vec<(ChatId, String)>,
    incoming: VecDeque<Vec<Update>>,
}

impl MockTelegramClient {
    /// Create new mock client
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Seed a pending join request for a chat
    pub fn add_pending_request(&self, chat: ChatId, user: UserProfile) {
        let mut state = self.state.lock().unwrap();
        state
            .pending
            .entry(chat)
            .or_default()
            .push(JoinRequest { chat, user });
    }

    /// Make `pending_join_requests` fail for a chat
    pub fn fail_fetch_for(&self, chat: ChatId) {
        self.state.lock().unwrap().failing_fetches.insert(chat);
    }

    /// Make `approve_join_request` fail for a chat
    pub fn fail_approvals_for(&self, chat: ChatId) {
        self.state.lock().unwrap().failing_approvals.insert(chat);
    }

    /// Set a user's membership status for `chat_member_status` lookups
    pub fn set_member_status(&self, chat: ChatId, user: UserId, status: MemberStatus) {
        let mut state = self.state.lock().unwrap();
        state.member_status.insert((chat, user), status);
    }

    /// Queue a batch of updates for `next_updates`
    pub fn push_updates(&self, updates: Vec<Update>) {
        self.state.lock().unwrap().incoming.push_back(updates);
    }

    /// Approve calls recorded so far
    pub fn approved(&self) -> Vec<(ChatId, UserId)> {
        self.state.lock().unwrap().approved.clone()
    }

    /// Decline calls recorded so far
    pub fn declined(&self) -> Vec<(ChatId, UserId)> {
        self.state.lock().unwrap().declined.clone()
    }

    /// Messages sent so far
    pub fn sent_messages(&self) -> Vec<(ChatId, String)> {
        self.state.lock().unwrap().sent_messages.clone()
    }

    /// Messages sent to one chat
    pub fn sent_to(&self, chat: ChatId) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .sent_messages
            .iter()
            .filter(|(c, _)| *c == chat)
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Clear all state
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        *state = MockState::default();
    }
}

impl Default for MockTelegramClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TelegramClient for MockTelegramClient {
    async fn pending_join_requests(&self, chat: ChatId) -> TelegramResult<Vec<JoinRequest>> {
        let mut state = self.state.lock().unwrap();
        if state.failing_fetches.contains(&chat) {
            return Err(TelegramError::Network(format!(
                "fetch failed for chat {}",
                chat
            )));
        }
        // Requests are drained: a batch run consumes each one exactly once.
        Ok(state.pending.remove(&chat).unwrap_or_default())
    }

    async fn approve_join_request(&self, chat: ChatId, user: UserId) -> TelegramResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_approvals.contains(&chat) {
            return Err(TelegramError::Api {
                code: 400,
                description: format!("cannot approve in chat {}", chat),
            });
        }
        state.approved.push((chat, user));
        Ok(())
    }

    async fn decline_join_request(&self, chat: ChatId, user: UserId) -> TelegramResult<()> {
        let mut state = self.state.lock().unwrap();
        state.declined.push((chat, user));
        Ok(())
    }

    async fn send_message(&self, chat: ChatId, text: &str) -> TelegramResult<()> {
        let mut state = self.state.lock().unwrap();
        state.sent_messages.push((chat, text.to_string()));
        Ok(())
    }

    async fn chat_member_status(
        &self,
        chat: ChatId,
        user: UserId,
    ) -> TelegramResult<MemberStatus> {
        let state = self.state.lock().unwrap();
        state
            .member_status
            .get(&(chat, user))
            .copied()
            .ok_or_else(|| TelegramError::Api {
                code: 400,
                description: format!("member {} not found in chat {}", user, chat),
            })
    }

    async fn next_updates(&self) -> TelegramResult<Vec<Update>> {
        let mut state = self.state.lock().unwrap();
        Ok(state.incoming.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: i64) -> UserProfile {
        UserProfile {
            id: UserId(id),
            username: Some(format!("user{}", id)),
            first_name: None,
            last_name: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_pending_requests_are_drained() {
        let client = MockTelegramClient::new();
        let chat = ChatId(-100);
        client.add_pending_request(chat, profile(1));
        client.add_pending_request(chat, profile(2));

        let first = client.pending_join_requests(chat).await.unwrap();
        assert_eq!(first.len(), 2);

        let second = client.pending_join_requests(chat).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_injected_fetch_failure() {
        let client = MockTelegramClient::new();
        let chat = ChatId(-100);
        client.fail_fetch_for(chat);

        assert!(client.pending_join_requests(chat).await.is_err());
    }

    #[tokio::test]
    async fn test_records_approve_and_decline() {
        let client = MockTelegramClient::new();
        let chat = ChatId(-100);

        client.approve_join_request(chat, UserId(1)).await.unwrap();
        client.decline_join_request(chat, UserId(2)).await.unwrap();

        assert_eq!(client.approved(), vec![(chat, UserId(1))]);
        assert_eq!(client.declined(), vec![(chat, UserId(2))]);
    }
}
