//! Observer contract for conversation mutations.
//!
//! Every successful [`ConversationStore`](super::store::ConversationStore)
//! mutation produces exactly one [`MutationEvent`], delivered synchronously
//! to each subscribed [`ConversationObserver`] in subscription order.

use super::turn::{FailureReason, TurnId, TurnStatus};

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    /// A new turn was appended at `position`.
    Appended,
    /// An assistant turn moved `pending → streaming`.
    StreamingStarted,
    /// Text was appended to a streaming turn.
    ChunkAppended { delta: String },
    /// A streaming turn finished successfully.
    Completed,
    /// A streaming turn ended with an error; its partial content is kept.
    Errored { reason: FailureReason },
    /// The whole session was cleared. `turn_id` and `position` carry no
    /// meaning for this kind.
    Reset,
}

/// Notification emitted after a store mutation.
///
/// Carries enough to re-render the affected turn without reading the store:
/// its id, position in the transcript, new status and content length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationEvent {
    pub turn_id: TurnId,
    pub position: usize,
    pub status: TurnStatus,
    pub content_len: usize,
    pub kind: MutationKind,
}

/// Receives conversation mutation notifications.
///
/// Called while the store is being mutated; implementations must not call
/// back into the store.
pub trait ConversationObserver: Send + Sync {
    fn on_mutation(&self, event: &MutationEvent);
}

impl<F> ConversationObserver for F
where
    F: Fn(&MutationEvent) + Send + Sync,
{
    fn on_mutation(&self, event: &MutationEvent) {
        self(event)
    }
}
