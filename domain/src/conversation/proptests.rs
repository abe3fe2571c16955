//! Property tests for the conversation state machine.

use super::store::ConversationStore;
use super::turn::{FailureReason, Role, TurnId, TurnStatus};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    AppendUser(String),
    AppendAssistant,
    Begin(usize),
    Chunk(usize, String),
    Complete(usize),
    Error(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[a-z ]{0,8}".prop_map(Op::AppendUser),
        Just(Op::AppendAssistant),
        (0usize..16).prop_map(Op::Begin),
        ((0usize..16), "[a-z0-9 ]{0,6}").prop_map(|(i, s)| Op::Chunk(i, s)),
        (0usize..16).prop_map(Op::Complete),
        (0usize..16).prop_map(Op::Error),
    ]
}

fn pick(ids: &[TurnId], index: usize) -> TurnId {
    if ids.is_empty() {
        TurnId::new(u64::MAX)
    } else {
        ids[index % ids.len()]
    }
}

fn streaming_count(store: &ConversationStore) -> usize {
    store
        .turns()
        .iter()
        .filter(|t| t.status() == TurnStatus::Streaming)
        .count()
}

proptest! {
    #[test]
    fn content_equals_concatenation_of_chunks(chunks in prop::collection::vec(".{0,12}", 0..40)) {
        let mut store = ConversationStore::new();
        store.append_turn(Role::User, "go").unwrap();
        let id = store.append_turn(Role::Assistant, "").unwrap();
        store.begin_streaming(id).unwrap();

        for chunk in &chunks {
            store.append_chunk(id, chunk).unwrap();
        }

        prop_assert_eq!(store.get(id).unwrap().content(), chunks.concat());
    }

    #[test]
    fn at_most_one_turn_streams(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut store = ConversationStore::new();
        let mut ids: Vec<TurnId> = Vec::new();

        for op in ops {
            let before = store.snapshot();
            let result = match op {
                Op::AppendUser(text) => store.append_turn(Role::User, text).map(|id| ids.push(id)),
                Op::AppendAssistant => store.append_turn(Role::Assistant, "").map(|id| ids.push(id)),
                Op::Begin(i) => store.begin_streaming(pick(&ids, i)),
                Op::Chunk(i, text) => store.append_chunk(pick(&ids, i), &text),
                Op::Complete(i) => store.complete_turn(pick(&ids, i)),
                Op::Error(i) => store.error_turn(pick(&ids, i), FailureReason::Unknown("x".to_string())),
            };

            prop_assert!(streaming_count(&store) <= 1);
            if result.is_err() {
                prop_assert_eq!(&before, &store.snapshot());
            }
            for (old, new) in before.iter().zip(store.snapshot().iter()) {
                // Content only ever grows, and terminal turns never change.
                prop_assert!(new.content().starts_with(old.content()));
                if old.status().is_terminal() {
                    prop_assert_eq!(old, new);
                }
            }
        }
    }
}
