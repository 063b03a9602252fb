//! Membership Event Tracker
//!
//! Turns chat-member transitions into departure-ledger writes. Only
//! `active -> departed` transitions on monitored channels count; joins,
//! promotions, demotions among active states, and re-joins are ignored.

use crate::ledger::DepartureLedger;
use crate::telegram::traits::{ChatId, MemberTransition};
use std::sync::Arc;
use tracing::info;

/// Watches membership transitions and records departures.
pub struct MembershipTracker {
    ledger: Arc<DepartureLedger>,
    monitored: Vec<ChatId>,
}

impl MembershipTracker {
    pub fn new(ledger: Arc<DepartureLedger>, monitored: Vec<ChatId>) -> Self {
        Self { ledger, monitored }
    }

    /// Handle one transition. Returns whether a departure was recorded.
    pub async fn observe(&self, transition: &MemberTransition) -> bool {
        if !self.monitored.contains(&transition.chat) {
            return false;
        }
        if !(transition.old_status.is_active() && transition.new_status.is_departed()) {
            return false;
        }

        self.ledger
            .record_left(transition.user, transition.chat)
            .await;
        info!(
            "User {} left channel {}, added to manual approval list",
            transition.user, transition.chat
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryStore;
    use crate::telegram::traits::{MemberStatus, UserId};

    const CHAT: ChatId = ChatId(-100);
    const OTHER_CHAT: ChatId = ChatId(-999);
    const USER: UserId = UserId(5);

    fn tracker() -> (MembershipTracker, Arc<DepartureLedger>) {
        let ledger = Arc::new(DepartureLedger::open(Box::new(MemoryStore::new())));
        (MembershipTracker::new(ledger.clone(), vec![CHAT]), ledger)
    }

    fn transition(chat: ChatId, old: MemberStatus, new: MemberStatus) -> MemberTransition {
        MemberTransition {
            chat,
            user: USER,
            old_status: old,
            new_status: new,
        }
    }

    #[tokio::test]
    async fn test_member_leaving_is_recorded() {
        let (tracker, ledger) = tracker();
        let recorded = tracker
            .observe(&transition(CHAT, MemberStatus::Member, MemberStatus::Left))
            .await;

        assert!(recorded);
        assert!(ledger.has_left(USER, CHAT).await);
    }

    #[tokio::test]
    async fn test_administrator_leaving_is_recorded() {
        let (tracker, ledger) = tracker();
        let recorded = tracker
            .observe(&transition(
                CHAT,
                MemberStatus::Administrator,
                MemberStatus::Left,
            ))
            .await;

        assert!(recorded);
        assert!(ledger.has_left(USER, CHAT).await);
    }

    #[tokio::test]
    async fn test_kick_counts_as_departure() {
        let (tracker, ledger) = tracker();
        tracker
            .observe(&transition(CHAT, MemberStatus::Member, MemberStatus::Kicked))
            .await;

        assert!(ledger.has_left(USER, CHAT).await);
    }

    #[tokio::test]
    async fn test_promotion_is_ignored() {
        let (tracker, ledger) = tracker();
        let recorded = tracker
            .observe(&transition(
                CHAT,
                MemberStatus::Member,
                MemberStatus::Administrator,
            ))
            .await;

        assert!(!recorded);
        assert!(!ledger.has_left(USER, CHAT).await);
    }

    #[tokio::test]
    async fn test_join_is_ignored() {
        let (tracker, ledger) = tracker();
        let recorded = tracker
            .observe(&transition(CHAT, MemberStatus::Left, MemberStatus::Member))
            .await;

        assert!(!recorded);
        assert!(!ledger.has_left(USER, CHAT).await);
    }

    #[tokio::test]
    async fn test_restricted_to_left_is_ignored() {
        // Restricted is neither active nor departed; no write either way.
        let (tracker, ledger) = tracker();
        let recorded = tracker
            .observe(&transition(
                CHAT,
                MemberStatus::Restricted,
                MemberStatus::Left,
            ))
            .await;

        assert!(!recorded);
        assert!(!ledger.has_left(USER, CHAT).await);
    }

    #[tokio::test]
    async fn test_unmonitored_chat_is_ignored() {
        let (tracker, ledger) = tracker();
        let recorded = tracker
            .observe(&transition(
                OTHER_CHAT,
                MemberStatus::Member,
                MemberStatus::Left,
            ))
            .await;

        assert!(!recorded);
        assert!(!ledger.has_left(USER, OTHER_CHAT).await);
    }
}
