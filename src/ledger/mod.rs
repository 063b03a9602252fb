//! Departure Ledger
//!
//! Durable record of which users left which monitored channels. A user with
//! an entry for a channel is never silently re-admitted there: the admission
//! processor rejects them without consulting the classifier until an operator
//! manually approves them (which clears the entry).
//!
//! Concurrency: membership-transition events arrive on a delivery path that
//! runs concurrently with batch admission runs, so every read-modify-persist
//! sequence is guarded by one internal async mutex.
//!
//! Failure semantics:
//! - read failure at startup fails open (empty ledger, logged)
//! - write failure is logged and in-memory state remains authoritative;
//!   the mutation is never rolled back, only the durability guarantee is lost

pub mod store;

#[cfg(test)]
mod proptests;

use crate::telegram::traits::{ChatId, UserId};
use store::{LedgerMap, LedgerStore};
use tokio::sync::Mutex;
use tracing::{error, warn};

pub use store::{JsonFileStore, MemoryStore, StoreError};

/// Persistent user → departed-channels map with an injected storage backend.
pub struct DepartureLedger {
    entries: Mutex<LedgerMap>,
    store: Box<dyn LedgerStore>,
}

impl DepartureLedger {
    /// Open the ledger, loading the durable record.
    ///
    /// A failed load yields an empty ledger rather than aborting startup.
    pub fn open(store: Box<dyn LedgerStore>) -> Self {
        let entries = match store.load() {
            Ok(map) => map,
            Err(e) => {
                warn!("Failed to load departure ledger, starting empty: {}", e);
                LedgerMap::new()
            }
        };
        Self {
            entries: Mutex::new(entries),
            store,
        }
    }

    /// Canonical ledger key for a user id.
    fn key(user: UserId) -> String {
        user.0.to_string()
    }

    /// True iff `chat` is recorded in `user`'s entry.
    pub async fn has_left(&self, user: UserId, chat: ChatId) -> bool {
        let entries = self.entries.lock().await;
        entries
            .get(&Self::key(user))
            .map(|chats| chats.contains(&chat))
            .unwrap_or(false)
    }

    /// Record that `user` departed `chat`. Idempotent; persists before
    /// returning.
    pub async fn record_left(&self, user: UserId, chat: ChatId) {
        let mut entries = self.entries.lock().await;
        let inserted = entries.entry(Self::key(user)).or_default().insert(chat);
        if inserted {
            self.persist_locked(&entries);
        }
    }

    /// Remove `chat` from `user`'s entry, dropping the entry entirely when
    /// its last channel goes. Idempotent; persists before returning.
    ///
    /// Returns whether anything was removed.
    pub async fn clear(&self, user: UserId, chat: ChatId) -> bool {
        let mut entries = self.entries.lock().await;
        let key = Self::key(user);
        let removed = match entries.get_mut(&key) {
            Some(chats) => {
                let removed = chats.remove(&chat);
                if chats.is_empty() {
                    entries.remove(&key);
                }
                removed
            }
            None => false,
        };
        if removed {
            self.persist_locked(&entries);
        }
        removed
    }

    /// Consistent point-in-time view of all entries.
    pub async fn snapshot(&self) -> Vec<(String, Vec<ChatId>)> {
        let entries = self.entries.lock().await;
        entries
            .iter()
            .map(|(user, chats)| (user.clone(), chats.iter().copied().collect()))
            .collect()
    }

    /// Number of users with at least one recorded departure.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Rewrite the durable record while the entry lock is held.
    ///
    /// On failure the in-memory state stays authoritative for the rest of the
    /// process lifetime; only durability across a restart is lost.
    fn persist_locked(&self, entries: &LedgerMap) {
        if let Err(e) = self.store.persist(entries) {
            error!("Failed to persist departure ledger: {}", e);
        }
    }
}

/// Helper for seeding test ledgers.
#[cfg(test)]
pub(crate) fn entry(user: i64, chats: &[i64]) -> (String, std::collections::BTreeSet<ChatId>) {
    (
        user.to_string(),
        chats.iter().map(|c| ChatId(*c)).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::MemoryStore;

    const ALICE: UserId = UserId(1);
    const CHAT_A: ChatId = ChatId(-100);
    const CHAT_B: ChatId = ChatId(-200);

    fn empty_ledger() -> DepartureLedger {
        DepartureLedger::open(Box::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_record_then_has_left() {
        let ledger = empty_ledger();
        assert!(!ledger.has_left(ALICE, CHAT_A).await);

        ledger.record_left(ALICE, CHAT_A).await;
        assert!(ledger.has_left(ALICE, CHAT_A).await);
        assert!(!ledger.has_left(ALICE, CHAT_B).await);
    }

    #[tokio::test]
    async fn test_record_is_idempotent() {
        let ledger = empty_ledger();
        ledger.record_left(ALICE, CHAT_A).await;
        ledger.record_left(ALICE, CHAT_A).await;

        let snapshot = ledger.snapshot().await;
        assert_eq!(snapshot, vec![("1".to_string(), vec![CHAT_A])]);
    }

    #[tokio::test]
    async fn test_clear_removes_and_is_idempotent() {
        let ledger = empty_ledger();
        ledger.record_left(ALICE, CHAT_A).await;

        assert!(ledger.clear(ALICE, CHAT_A).await);
        assert!(!ledger.has_left(ALICE, CHAT_A).await);
        assert!(!ledger.clear(ALICE, CHAT_A).await);
    }

    #[tokio::test]
    async fn test_clearing_last_channel_drops_entry() {
        let ledger = empty_ledger();
        ledger.record_left(ALICE, CHAT_A).await;
        ledger.clear(ALICE, CHAT_A).await;

        assert!(ledger.snapshot().await.is_empty());
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_clearing_one_channel_keeps_others() {
        let ledger = empty_ledger();
        ledger.record_left(ALICE, CHAT_A).await;
        ledger.record_left(ALICE, CHAT_B).await;
        ledger.clear(ALICE, CHAT_A).await;

        assert!(!ledger.has_left(ALICE, CHAT_A).await);
        assert!(ledger.has_left(ALICE, CHAT_B).await);
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_mutations_persist_before_returning() {
        let store = MemoryStore::new();
        let contents_handle = std::sync::Arc::new(store);
        // DepartureLedger owns its store, so hold a second Arc for assertions.
        struct Shared(std::sync::Arc<MemoryStore>);
        impl LedgerStore for Shared {
            fn load(&self) -> Result<LedgerMap, StoreError> {
                self.0.load()
            }
            fn persist(&self, map: &LedgerMap) -> Result<(), StoreError> {
                self.0.persist(map)
            }
        }

        let ledger = DepartureLedger::open(Box::new(Shared(contents_handle.clone())));
        ledger.record_left(ALICE, CHAT_A).await;

        let durable = contents_handle.contents();
        assert!(durable.get("1").unwrap().contains(&CHAT_A));

        ledger.clear(ALICE, CHAT_A).await;
        assert!(contents_handle.contents().is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_fails_open() {
        let store = MemoryStore::with_contents(LedgerMap::from([entry(1, &[-100])]));
        store.fail_reads(true);

        let ledger = DepartureLedger::open(Box::new(store));
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_write_failure_keeps_memory_authoritative() {
        let store = MemoryStore::new();
        store.fail_writes(true);

        let ledger = DepartureLedger::open(Box::new(store));
        ledger.record_left(ALICE, CHAT_A).await;

        // The mutation is not rolled back.
        assert!(ledger.has_left(ALICE, CHAT_A).await);
    }

    #[tokio::test]
    async fn test_open_loads_existing_record() {
        let store = MemoryStore::with_contents(LedgerMap::from([entry(42, &[-100, -200])]));
        let ledger = DepartureLedger::open(Box::new(store));

        assert!(ledger.has_left(UserId(42), ChatId(-100)).await);
        assert!(ledger.has_left(UserId(42), ChatId(-200)).await);
        assert!(!ledger.has_left(UserId(42), ChatId(-300)).await);
    }
}
