//! Property-based tests for the departure ledger
//!
//! Tests for:
//! - Agreement with a reference model under arbitrary op interleavings
//! - Idempotence of record/clear
//! - The no-empty-entries invariant on every snapshot

use super::store::MemoryStore;
use super::DepartureLedger;
use crate::telegram::traits::{ChatId, UserId};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
enum Op {
    Record { user: i64, chat: i64 },
    Clear { user: i64, chat: i64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    // Small id spaces so operations actually collide.
    let user = 0i64..4;
    let chat = -3i64..0;
    prop_oneof![
        (user.clone(), chat.clone()).prop_map(|(user, chat)| Op::Record { user, chat }),
        (user, chat).prop_map(|(user, chat)| Op::Clear { user, chat }),
    ]
}

fn run_ops(ops: &[Op]) -> (Vec<(String, Vec<ChatId>)>, HashMap<String, HashSet<i64>>) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");

    rt.block_on(async {
        let ledger = DepartureLedger::open(Box::new(MemoryStore::new()));
        let mut model: HashMap<String, HashSet<i64>> = HashMap::new();

        for op in ops {
            match *op {
                Op::Record { user, chat } => {
                    ledger.record_left(UserId(user), ChatId(chat)).await;
                    model.entry(user.to_string()).or_default().insert(chat);
                }
                Op::Clear { user, chat } => {
                    ledger.clear(UserId(user), ChatId(chat)).await;
                    if let Some(chats) = model.get_mut(&user.to_string()) {
                        chats.remove(&chat);
                        if chats.is_empty() {
                            model.remove(&user.to_string());
                        }
                    }
                }
            }
        }

        (ledger.snapshot().await, model)
    })
}

proptest! {
    /// Property: the ledger agrees with a reference model after any sequence
    /// of record/clear operations.
    #[test]
    fn ledger_matches_model(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let (snapshot, model) = run_ops(&ops);

        let observed: HashMap<String, HashSet<i64>> = snapshot
            .iter()
            .map(|(user, chats)| {
                (user.clone(), chats.iter().map(|c| c.0).collect())
            })
            .collect();

        prop_assert_eq!(observed, model);
    }

    /// Property: no snapshot ever contains an entry with an empty channel set.
    #[test]
    fn no_empty_entries(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let (snapshot, _) = run_ops(&ops);
        for (user, chats) in snapshot {
            prop_assert!(!chats.is_empty(), "user {} has an empty entry", user);
        }
    }

    /// Property: doubling any single operation leaves observable state
    /// unchanged (idempotence of record and clear).
    #[test]
    fn doubled_ops_are_idempotent(
        ops in prop::collection::vec(op_strategy(), 1..20),
        dup_index in any::<prop::sample::Index>(),
    ) {
        let idx = dup_index.index(ops.len());
        let mut doubled = ops.clone();
        doubled.insert(idx, ops[idx].clone());

        let (snapshot_once, _) = run_ops(&ops);
        let (snapshot_twice, _) = run_ops(&doubled);

        prop_assert_eq!(snapshot_once, snapshot_twice);
    }
}
