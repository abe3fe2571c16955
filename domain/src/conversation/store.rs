//! In-memory conversation store.
//!
//! [`ConversationStore`] owns the ordered turn sequence of one session and is
//! the only place where turn state changes. Each operation either applies
//! completely and notifies observers, or fails without touching state.

use super::observer::{ConversationObserver, MutationEvent, MutationKind, SubscriptionId};
use super::turn::{FailureReason, Role, Turn, TurnId, TurnStatus};
use crate::core::error::DomainError;
use crate::session::entities::Message;
use std::collections::HashMap;
use std::sync::Arc;

/// Ordered transcript of one chat session (Aggregate Root)
///
/// # Lifecycle of an assistant turn
///
/// ```text
/// append_turn(Assistant, "") → pending
/// begin_streaming            → streaming   (at most one per conversation)
/// append_chunk × N           → streaming   (content grows, append-only)
/// complete_turn / error_turn → complete / errored (terminal)
/// ```
pub struct ConversationStore {
    turns: Vec<Turn>,
    positions: HashMap<TurnId, usize>,
    streaming: Option<TurnId>,
    next_turn_id: u64,
    observers: Vec<(SubscriptionId, Arc<dyn ConversationObserver>)>,
    next_subscription_id: u64,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("turns", &self.turns)
            .field("streaming", &self.streaming)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ConversationStore {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self {
            turns: Vec::new(),
            positions: HashMap::new(),
            streaming: None,
            next_turn_id: 1,
            observers: Vec::new(),
            next_subscription_id: 1,
        }
    }

    // ==================== Observers ====================

    /// Register an observer for all subsequent mutations.
    pub fn subscribe(&mut self, observer: Arc<dyn ConversationObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription_id);
        self.next_subscription_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Remove an observer. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    // ==================== Mutations ====================

    /// Append a new turn at the end of the conversation.
    ///
    /// Assistant turns must start empty; they are created `pending`.
    pub fn append_turn(
        &mut self,
        role: Role,
        initial_content: impl Into<String>,
    ) -> Result<TurnId, DomainError> {
        let content = initial_content.into();
        let turn_id = TurnId::new(self.next_turn_id);

        if role == Role::Assistant && !content.is_empty() {
            return Err(DomainError::InvalidTransition {
                turn_id,
                status: TurnStatus::Pending,
                action: "create an assistant turn with initial content",
            });
        }

        self.next_turn_id += 1;
        let position = self.turns.len();
        self.turns.push(Turn::new(turn_id, role, content));
        self.positions.insert(turn_id, position);

        self.notify_turn(position, MutationKind::Appended);
        Ok(turn_id)
    }

    /// Like [`append_turn`](Self::append_turn), parsing the role from text.
    pub fn append_turn_str(
        &mut self,
        role: &str,
        initial_content: impl Into<String>,
    ) -> Result<TurnId, DomainError> {
        let role: Role = role.parse()?;
        self.append_turn(role, initial_content)
    }

    /// Move an assistant turn from `pending` to `streaming`.
    pub fn begin_streaming(&mut self, turn_id: TurnId) -> Result<(), DomainError> {
        let position = self.position_of(turn_id)?;
        let status = self.turns[position].status();

        if status != TurnStatus::Pending {
            return Err(DomainError::InvalidTransition {
                turn_id,
                status,
                action: "begin streaming",
            });
        }
        if self.streaming.is_some() {
            return Err(DomainError::InvalidTransition {
                turn_id,
                status,
                action: "begin streaming (another turn is streaming)",
            });
        }

        self.turns[position].set_status(TurnStatus::Streaming);
        self.streaming = Some(turn_id);

        self.notify_turn(position, MutationKind::StreamingStarted);
        Ok(())
    }

    /// Append `text` to a streaming turn's content buffer.
    pub fn append_chunk(&mut self, turn_id: TurnId, text: &str) -> Result<(), DomainError> {
        let position = self.streaming_position(turn_id, "append a chunk")?;
        self.turns[position].push_content(text);

        self.notify_turn(
            position,
            MutationKind::ChunkAppended {
                delta: text.to_string(),
            },
        );
        Ok(())
    }

    /// Finish a streaming turn successfully.
    pub fn complete_turn(&mut self, turn_id: TurnId) -> Result<(), DomainError> {
        let position = self.streaming_position(turn_id, "complete")?;
        self.turns[position].set_status(TurnStatus::Complete);
        self.streaming = None;

        self.notify_turn(position, MutationKind::Completed);
        Ok(())
    }

    /// Finish a streaming turn with an error, keeping any partial content.
    pub fn error_turn(&mut self, turn_id: TurnId, reason: FailureReason) -> Result<(), DomainError> {
        let position = self.streaming_position(turn_id, "fail")?;
        self.turns[position].set_failure(reason.clone());
        self.streaming = None;

        self.notify_turn(position, MutationKind::Errored { reason });
        Ok(())
    }

    /// Drop every turn (full session reset). Observers stay subscribed and
    /// turn ids are never reused.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.positions.clear();
        self.streaming = None;

        let event = MutationEvent {
            turn_id: TurnId::new(0),
            position: 0,
            status: TurnStatus::Complete,
            content_len: 0,
            kind: MutationKind::Reset,
        };
        self.notify(&event);
    }

    // ==================== Queries ====================

    /// Read-only copy of the current transcript for rendering.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn get(&self, turn_id: TurnId) -> Option<&Turn> {
        self.positions.get(&turn_id).map(|&pos| &self.turns[pos])
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The turn currently `streaming`, if any.
    pub fn streaming_turn(&self) -> Option<TurnId> {
        self.streaming
    }

    /// The most recent turn that is `pending` or `streaming`, if any.
    pub fn in_flight_turn(&self) -> Option<TurnId> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.status().is_in_flight())
            .map(|t| t.id())
    }

    /// All turns reduced to `{role, content}`, in order.
    pub fn transcript(&self) -> Vec<Message> {
        self.turns.iter().map(Message::from).collect()
    }

    /// Turns up to and including `turn_id`, reduced to `{role, content}`.
    pub fn transcript_through(&self, turn_id: TurnId) -> Result<Vec<Message>, DomainError> {
        let position = self.position_of(turn_id)?;
        Ok(self.turns[..=position].iter().map(Message::from).collect())
    }

    // ==================== Internals ====================

    fn position_of(&self, turn_id: TurnId) -> Result<usize, DomainError> {
        self.positions
            .get(&turn_id)
            .copied()
            .ok_or(DomainError::UnknownTurn(turn_id))
    }

    fn streaming_position(
        &self,
        turn_id: TurnId,
        action: &'static str,
    ) -> Result<usize, DomainError> {
        let position = self.position_of(turn_id)?;
        let status = self.turns[position].status();
        if status != TurnStatus::Streaming {
            return Err(DomainError::InvalidTransition {
                turn_id,
                status,
                action,
            });
        }
        Ok(position)
    }

    fn notify_turn(&self, position: usize, kind: MutationKind) {
        if self.observers.is_empty() {
            return;
        }
        let turn = &self.turns[position];
        let event = MutationEvent {
            turn_id: turn.id(),
            position,
            status: turn.status(),
            content_len: turn.content().len(),
            kind,
        };
        self.notify(&event);
    }

    fn notify(&self, event: &MutationEvent) {
        for (_, observer) in &self.observers {
            observer.on_mutation(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // ==================== Helpers ====================

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<MutationEvent>>,
    }

    impl RecordingObserver {
        fn kinds(&self) -> Vec<MutationKind> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.kind.clone())
                .collect()
        }
    }

    impl ConversationObserver for RecordingObserver {
        fn on_mutation(&self, event: &MutationEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn streaming_assistant(store: &mut ConversationStore) -> TurnId {
        store.append_turn(Role::User, "hello").unwrap();
        let id = store.append_turn(Role::Assistant, "").unwrap();
        store.begin_streaming(id).unwrap();
        id
    }

    // ==================== append_turn ====================

    #[test]
    fn append_preserves_insertion_order() {
        let mut store = ConversationStore::new();
        let system = store.append_turn(Role::System, "be brief").unwrap();
        let user = store.append_turn(Role::User, "2+2?").unwrap();
        let assistant = store.append_turn(Role::Assistant, "").unwrap();

        let ids: Vec<_> = store.snapshot().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![system, user, assistant]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn assistant_turn_starts_pending_and_empty() {
        let mut store = ConversationStore::new();
        let id = store.append_turn(Role::Assistant, "").unwrap();
        let turn = store.get(id).unwrap();
        assert_eq!(turn.status(), TurnStatus::Pending);
        assert_eq!(turn.content(), "");
    }

    #[test]
    fn assistant_turn_with_initial_content_is_rejected() {
        let mut store = ConversationStore::new();
        let err = store.append_turn(Role::Assistant, "cheating").unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn append_turn_str_rejects_unknown_role() {
        let mut store = ConversationStore::new();
        let err = store.append_turn_str("moderator", "hi").unwrap_err();
        assert_eq!(err, DomainError::InvalidRole("moderator".to_string()));
        assert!(store.is_empty());

        let id = store.append_turn_str("system", "be brief").unwrap();
        assert_eq!(store.get(id).unwrap().role(), Role::System);
    }

    #[test]
    fn turn_ids_are_unique() {
        let mut store = ConversationStore::new();
        let a = store.append_turn(Role::User, "a").unwrap();
        let b = store.append_turn(Role::User, "b").unwrap();
        assert_ne!(a, b);
    }

    // ==================== begin_streaming ====================

    #[test]
    fn begin_streaming_requires_pending() {
        let mut store = ConversationStore::new();
        let user = store.append_turn(Role::User, "hi").unwrap();
        let err = store.begin_streaming(user).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidTransition {
                status: TurnStatus::Complete,
                ..
            }
        ));
    }

    #[test]
    fn begin_streaming_twice_fails() {
        let mut store = ConversationStore::new();
        let id = streaming_assistant(&mut store);
        assert!(store.begin_streaming(id).is_err());
    }

    #[test]
    fn only_one_turn_may_stream() {
        let mut store = ConversationStore::new();
        let first = streaming_assistant(&mut store);
        let second = store.append_turn(Role::Assistant, "").unwrap();

        let err = store.begin_streaming(second).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert_eq!(store.get(second).unwrap().status(), TurnStatus::Pending);
        assert_eq!(store.streaming_turn(), Some(first));

        store.complete_turn(first).unwrap();
        store.begin_streaming(second).unwrap();
        assert_eq!(store.streaming_turn(), Some(second));
    }

    #[test]
    fn unknown_turn_is_reported() {
        let mut store = ConversationStore::new();
        let err = store.begin_streaming(TurnId::new(99)).unwrap_err();
        assert_eq!(err, DomainError::UnknownTurn(TurnId::new(99)));
    }

    // ==================== append_chunk ====================

    #[test]
    fn chunks_concatenate_in_call_order() {
        let mut store = ConversationStore::new();
        let id = streaming_assistant(&mut store);
        for chunk in ["The ", "answer", " is ", "4", "."] {
            store.append_chunk(id, chunk).unwrap();
        }
        assert_eq!(store.get(id).unwrap().content(), "The answer is 4.");
    }

    #[test]
    fn append_chunk_requires_streaming() {
        let mut store = ConversationStore::new();
        store.append_turn(Role::User, "hi").unwrap();
        let id = store.append_turn(Role::Assistant, "").unwrap();

        let err = store.append_chunk(id, "early").unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidTransition {
                status: TurnStatus::Pending,
                ..
            }
        ));
        assert_eq!(store.get(id).unwrap().content(), "");
    }

    #[test]
    fn append_chunk_after_complete_fails() {
        let mut store = ConversationStore::new();
        let id = streaming_assistant(&mut store);
        store.append_chunk(id, "4").unwrap();
        store.complete_turn(id).unwrap();

        assert!(store.append_chunk(id, "5").is_err());
        assert_eq!(store.get(id).unwrap().content(), "4");
    }

    // ==================== terminal transitions ====================

    #[test]
    fn complete_turn_is_terminal() {
        let mut store = ConversationStore::new();
        let id = streaming_assistant(&mut store);
        store.complete_turn(id).unwrap();

        assert_eq!(store.get(id).unwrap().status(), TurnStatus::Complete);
        assert_eq!(store.streaming_turn(), None);
        assert!(store.complete_turn(id).is_err());
        assert!(store.error_turn(id, FailureReason::Cancelled).is_err());
    }

    #[test]
    fn error_turn_keeps_partial_content() {
        let mut store = ConversationStore::new();
        let id = streaming_assistant(&mut store);
        store.append_chunk(id, "Hi").unwrap();
        store.error_turn(id, FailureReason::Cancelled).unwrap();

        let turn = store.get(id).unwrap();
        assert_eq!(turn.status(), TurnStatus::Errored);
        assert_eq!(turn.content(), "Hi");
        assert_eq!(turn.failure(), Some(&FailureReason::Cancelled));
        assert!(store.complete_turn(id).is_err());
    }

    #[test]
    fn pending_turn_cannot_skip_to_terminal() {
        let mut store = ConversationStore::new();
        let id = store.append_turn(Role::Assistant, "").unwrap();
        assert!(store.complete_turn(id).is_err());
        assert!(store.error_turn(id, FailureReason::Timeout).is_err());
        assert_eq!(store.get(id).unwrap().status(), TurnStatus::Pending);
    }

    // ==================== queries ====================

    #[test]
    fn in_flight_turn_tracks_pending_and_streaming() {
        let mut store = ConversationStore::new();
        assert_eq!(store.in_flight_turn(), None);

        store.append_turn(Role::User, "hi").unwrap();
        let id = store.append_turn(Role::Assistant, "").unwrap();
        assert_eq!(store.in_flight_turn(), Some(id));

        store.begin_streaming(id).unwrap();
        assert_eq!(store.in_flight_turn(), Some(id));

        store.complete_turn(id).unwrap();
        assert_eq!(store.in_flight_turn(), None);
    }

    #[test]
    fn transcript_through_stops_at_turn() {
        let mut store = ConversationStore::new();
        store.append_turn(Role::System, "be brief").unwrap();
        let user = store.append_turn(Role::User, "2+2?").unwrap();
        store.append_turn(Role::Assistant, "").unwrap();

        let transcript = store.transcript_through(user).unwrap();
        assert_eq!(
            transcript,
            vec![Message::system("be brief"), Message::user("2+2?")]
        );
        assert_eq!(store.transcript().len(), 3);
    }

    #[test]
    fn snapshot_is_detached_copy() {
        let mut store = ConversationStore::new();
        let id = streaming_assistant(&mut store);
        let before = store.snapshot();
        store.append_chunk(id, "more").unwrap();

        assert_eq!(before[1].content(), "");
        assert_eq!(store.snapshot()[1].content(), "more");
    }

    // ==================== reset ====================

    #[test]
    fn reset_clears_turns_but_not_ids() {
        let mut store = ConversationStore::new();
        let first = streaming_assistant(&mut store);
        store.reset();

        assert!(store.is_empty());
        assert_eq!(store.streaming_turn(), None);
        assert!(store.get(first).is_none());

        let next = store.append_turn(Role::User, "again").unwrap();
        assert!(next > first);
    }

    // ==================== notifications ====================

    #[test]
    fn every_mutation_notifies_observers() {
        let mut store = ConversationStore::new();
        let observer = Arc::new(RecordingObserver::default());
        store.subscribe(observer.clone());

        let id = streaming_assistant(&mut store);
        store.append_chunk(id, "Hi").unwrap();
        store.error_turn(id, FailureReason::Timeout).unwrap();

        assert_eq!(
            observer.kinds(),
            vec![
                MutationKind::Appended,
                MutationKind::Appended,
                MutationKind::StreamingStarted,
                MutationKind::ChunkAppended {
                    delta: "Hi".to_string()
                },
                MutationKind::Errored {
                    reason: FailureReason::Timeout
                },
            ]
        );

        let events = observer.events.lock().unwrap();
        let chunk = &events[3];
        assert_eq!(chunk.turn_id, id);
        assert_eq!(chunk.position, 1);
        assert_eq!(chunk.status, TurnStatus::Streaming);
        assert_eq!(chunk.content_len, 2);
    }

    #[test]
    fn failed_mutation_does_not_notify() {
        let mut store = ConversationStore::new();
        let observer = Arc::new(RecordingObserver::default());
        store.subscribe(observer.clone());

        let _ = store.append_turn(Role::Assistant, "nope");
        let _ = store.begin_streaming(TurnId::new(42));
        assert!(observer.kinds().is_empty());
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut store = ConversationStore::new();
        let observer = Arc::new(RecordingObserver::default());
        let sub = store.subscribe(observer.clone());

        store.append_turn(Role::User, "one").unwrap();
        assert!(store.unsubscribe(sub));
        assert!(!store.unsubscribe(sub));
        store.append_turn(Role::User, "two").unwrap();

        assert_eq!(observer.kinds().len(), 1);
    }

    #[test]
    fn closures_can_observe() {
        let mut store = ConversationStore::new();
        let seen = Arc::new(Mutex::new(0usize));
        let counter = seen.clone();
        store.subscribe(Arc::new(move |_: &MutationEvent| {
            *counter.lock().unwrap() += 1;
        }));

        store.append_turn(Role::User, "hi").unwrap();
        store.reset();
        assert_eq!(*seen.lock().unwrap(), 2);
    }
}
