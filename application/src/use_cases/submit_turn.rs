//! Submit Turn use case.
//!
//! [`TurnController`] turns one line of user input into a streamed assistant
//! reply:
//!
//! 1. Validate the prompt and resolve the mode against the [`ModeCatalog`]
//! 2. Append the user turn and a `pending` assistant turn to the store
//! 3. Spawn a driver task that opens one gateway stream and applies its
//!    events to the assistant turn until a terminal state is reached
//!
//! The store is shared with the UI as a [`SharedConversation`]. The lock is
//! only taken for synchronous store calls and is never held across an
//! `.await`. Transport failures are never returned to the caller; they land
//! on the turn as `errored(reason)` and reach the UI through mutation events.

use crate::config::StreamSettings;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::inference_gateway::InferenceGateway;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use streamchat_domain::util::truncate_str;
use streamchat_domain::{
    ConversationStore, DomainError, FailureReason, InferenceRequest, ModeCatalog, Role,
    StreamEvent, TurnId, TurnStatus, UserPrompt,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Conversation store shared between the controller and its observers.
pub type SharedConversation = Arc<Mutex<ConversationStore>>;

fn lock_store(conversation: &SharedConversation) -> MutexGuard<'_, ConversationStore> {
    conversation.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Errors returned synchronously by [`TurnController::submit_turn`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitTurnError {
    /// Empty prompt or unknown mode. Nothing was appended or sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Another assistant turn is still pending or streaming.
    #[error("Turn {0} is still in flight")]
    TurnInFlight(TurnId),

    /// The store rejected an operation. Indicates a broken invariant.
    #[error("Conversation store error: {0}")]
    Store(#[from] DomainError),
}

/// Final state of an assistant turn once its driver task has exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub turn_id: TurnId,
    pub status: TurnStatus,
    pub content: String,
    pub failure: Option<FailureReason>,
}

impl TurnOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == TurnStatus::Complete
    }

    fn from_store(store: &ConversationStore, turn_id: TurnId) -> Self {
        match store.get(turn_id) {
            Some(turn) => Self {
                turn_id,
                status: turn.status(),
                content: turn.content().to_string(),
                failure: turn.failure().cloned(),
            },
            // The session was reset underneath the turn.
            None => Self {
                turn_id,
                status: TurnStatus::Errored,
                content: String::new(),
                failure: Some(FailureReason::Unknown(
                    "turn no longer in conversation".to_string(),
                )),
            },
        }
    }
}

struct ActiveTurn {
    turn_id: TurnId,
    token: CancellationToken,
}

type ActiveSlot = Arc<Mutex<Option<ActiveTurn>>>;

fn lock_active(active: &ActiveSlot) -> MutexGuard<'_, Option<ActiveTurn>> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cancels one assistant turn. Cheap to clone and safe to call from any
/// thread, any number of times.
#[derive(Clone)]
pub struct TurnCanceller {
    turn_id: TurnId,
    token: CancellationToken,
    conversation: SharedConversation,
    active: ActiveSlot,
}

impl TurnCanceller {
    /// Close the transport and mark the turn `errored(cancelled)`.
    ///
    /// Has no effect once the turn is terminal. The token is fired under the
    /// store lock, so the driver can never apply a chunk after this returns.
    /// The controller's active slot is released here too: a new turn may be
    /// submitted as soon as this returns.
    pub fn cancel(&self) {
        // Same lock order as `submit_turn`: active slot, then store.
        let mut active = lock_active(&self.active);
        let mut store = lock_store(&self.conversation);
        if self.token.is_cancelled() {
            return;
        }
        self.token.cancel();
        if active.as_ref().map(|a| a.turn_id) == Some(self.turn_id) {
            *active = None;
        }
        drop(active);

        let Some(status) = store.get(self.turn_id).map(|t| t.status()) else {
            return;
        };
        let result = match status {
            TurnStatus::Pending => store
                .begin_streaming(self.turn_id)
                .and_then(|()| store.error_turn(self.turn_id, FailureReason::Cancelled)),
            TurnStatus::Streaming => store.error_turn(self.turn_id, FailureReason::Cancelled),
            TurnStatus::Complete | TurnStatus::Errored => Ok(()),
        };

        match result {
            Ok(()) if !status.is_terminal() => info!("Cancelled {}", self.turn_id),
            Ok(()) => {}
            Err(e) => warn!("Failed to mark {} cancelled: {}", self.turn_id, e),
        }
    }
}

/// Handle to a submitted turn.
pub struct TurnHandle {
    canceller: TurnCanceller,
    task: JoinHandle<TurnOutcome>,
}

impl TurnHandle {
    /// Id of the assistant turn being streamed.
    pub fn turn_id(&self) -> TurnId {
        self.canceller.turn_id
    }

    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// A detached canceller, for use while [`wait`](Self::wait) is pending.
    pub fn canceller(&self) -> TurnCanceller {
        self.canceller.clone()
    }

    /// Whether the driver task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the turn to reach a terminal state.
    pub async fn wait(self) -> TurnOutcome {
        let turn_id = self.canceller.turn_id;
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Driver task for {} failed: {}", turn_id, e);
                let store = lock_store(&self.canceller.conversation);
                TurnOutcome::from_store(&store, turn_id)
            }
        }
    }
}

/// Use case for submitting user turns and streaming the assistant reply.
///
/// Allows at most one assistant turn in flight: a second submission while a
/// turn is pending or streaming fails with [`SubmitTurnError::TurnInFlight`].
#[derive(Clone)]
pub struct TurnController {
    conversation: SharedConversation,
    catalog: Arc<ModeCatalog>,
    gateway: Arc<dyn InferenceGateway>,
    settings: StreamSettings,
    conversation_logger: Arc<dyn ConversationLogger>,
    active: ActiveSlot,
}

impl TurnController {
    pub fn new(
        conversation: SharedConversation,
        catalog: Arc<ModeCatalog>,
        gateway: Arc<dyn InferenceGateway>,
    ) -> Self {
        Self {
            conversation,
            catalog,
            gateway,
            settings: StreamSettings::default(),
            conversation_logger: Arc::new(NoConversationLogger),
            active: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_settings(mut self, settings: StreamSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn conversation(&self) -> &SharedConversation {
        &self.conversation
    }

    pub fn catalog(&self) -> &ModeCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// The assistant turn whose driver task is still running, if any.
    pub fn active_turn(&self) -> Option<TurnId> {
        lock_active(&self.active).as_ref().map(|a| a.turn_id)
    }

    /// Submit `user_text` under `mode_key` and start streaming the reply.
    ///
    /// Returns once both turns are appended and the driver task is spawned.
    /// Must be called from within a Tokio runtime.
    pub fn submit_turn(
        &self,
        user_text: &str,
        mode_key: &str,
    ) -> Result<TurnHandle, SubmitTurnError> {
        let prompt = UserPrompt::try_new(user_text)
            .ok_or_else(|| SubmitTurnError::Validation("message cannot be empty".to_string()))?;
        let mode = self
            .catalog
            .resolve(mode_key)
            .map_err(|e| SubmitTurnError::Validation(e.to_string()))?;

        let mut active = lock_active(&self.active);
        if let Some(current) = active.as_ref() {
            return Err(SubmitTurnError::TurnInFlight(current.turn_id));
        }

        let (turn_id, transcript) = {
            let mut store = lock_store(&self.conversation);
            if let Some(in_flight) = store.in_flight_turn() {
                return Err(SubmitTurnError::TurnInFlight(in_flight));
            }
            let user_id = store.append_turn(Role::User, prompt.into_content())?;
            let assistant_id = store.append_turn(Role::Assistant, "")?;
            (assistant_id, store.transcript_through(user_id)?)
        };

        let token = CancellationToken::new();
        *active = Some(ActiveTurn {
            turn_id,
            token: token.clone(),
        });
        drop(active);

        info!(
            turn_id = %turn_id,
            mode = %mode.key,
            model = %mode.model_identifier,
            "Submitting turn: {}",
            truncate_str(user_text, 100)
        );
        self.conversation_logger.log(ConversationEvent::new(
            "turn_submitted",
            json!({
                "turn_id": turn_id.as_u64(),
                "mode": mode.key.as_str(),
                "model": mode.model_identifier,
                "prompt": user_text,
                "transcript_len": transcript.len(),
            }),
        ));

        let request = InferenceRequest::new(transcript, mode.model_identifier);
        let driver = TurnDriver {
            turn_id,
            conversation: self.conversation.clone(),
            gateway: self.gateway.clone(),
            settings: self.settings.clone(),
            token: token.clone(),
            active: self.active.clone(),
            conversation_logger: self.conversation_logger.clone(),
        };
        let task = tokio::spawn(driver.run(request));

        Ok(TurnHandle {
            canceller: TurnCanceller {
                turn_id,
                token,
                conversation: self.conversation.clone(),
                active: self.active.clone(),
            },
            task,
        })
    }
}

// ==================== Driver ====================

/// How a driver task ended.
enum Termination {
    Completed,
    Failed(FailureReason),
    Cancelled,
    /// The store refused an update (e.g. the session was reset mid-stream).
    Detached(DomainError),
}

/// Owns one assistant turn from gateway open to terminal state.
struct TurnDriver {
    turn_id: TurnId,
    conversation: SharedConversation,
    gateway: Arc<dyn InferenceGateway>,
    settings: StreamSettings,
    token: CancellationToken,
    active: ActiveSlot,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl TurnDriver {
    async fn run(self, request: InferenceRequest) -> TurnOutcome {
        let termination = self.stream(request).await;
        self.finish(termination)
    }

    async fn stream(&self, request: InferenceRequest) -> Termination {
        let window = self.settings.inactivity_timeout;

        let opened = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Termination::Cancelled,
            opened = tokio::time::timeout(window, self.gateway.open_stream(request)) => opened,
        };
        let mut handle = match opened {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => {
                warn!("Failed to open stream for {}: {}", self.turn_id, e);
                return self.fail(e.failure_reason());
            }
            Err(_) => return self.fail(FailureReason::Timeout),
        };
        debug!("Stream opened for {}", self.turn_id);
        if let Some(termination) = self.mark_streaming() {
            return termination;
        }

        // Returning drops `handle`, which closes the transport.
        loop {
            let next = tokio::select! {
                biased;
                _ = self.token.cancelled() => return Termination::Cancelled,
                next = tokio::time::timeout(window, handle.next()) => next,
            };
            let event = match next {
                Ok(Some(event)) => event,
                Ok(None) => {
                    return self.fail(FailureReason::Unknown(
                        "stream closed without a terminal event".to_string(),
                    ));
                }
                Err(_) => return self.fail(FailureReason::Timeout),
            };
            if let Some(termination) = self.apply(event) {
                return termination;
            }
        }
    }

    /// Apply one stream event under the store lock. Returns the termination
    /// once the turn is terminal.
    fn apply(&self, event: StreamEvent) -> Option<Termination> {
        let mut store = lock_store(&self.conversation);
        if self.token.is_cancelled() {
            return Some(Termination::Cancelled);
        }
        match self.apply_locked(&mut store, event) {
            Ok(termination) => termination,
            Err(e) => Some(Termination::Detached(e)),
        }
    }

    fn apply_locked(
        &self,
        store: &mut ConversationStore,
        event: StreamEvent,
    ) -> Result<Option<Termination>, DomainError> {
        self.begin_if_pending(store)?;
        match event {
            StreamEvent::Delta(text) => {
                trace!("{} +{} bytes", self.turn_id, text.len());
                store.append_chunk(self.turn_id, &text)?;
                Ok(None)
            }
            StreamEvent::Completed => {
                store.complete_turn(self.turn_id)?;
                Ok(Some(Termination::Completed))
            }
            StreamEvent::Error(failure) => {
                let reason = FailureReason::from(failure);
                store.error_turn(self.turn_id, reason.clone())?;
                Ok(Some(Termination::Failed(reason)))
            }
        }
    }

    /// The endpoint has answered, so the turn is streaming even before the
    /// first delta.
    fn mark_streaming(&self) -> Option<Termination> {
        let mut store = lock_store(&self.conversation);
        if self.token.is_cancelled() {
            return Some(Termination::Cancelled);
        }
        self.begin_if_pending(&mut store)
            .err()
            .map(Termination::Detached)
    }

    /// Move the turn to `errored(reason)`, passing through `streaming` if no
    /// event had arrived yet.
    fn fail(&self, reason: FailureReason) -> Termination {
        let mut store = lock_store(&self.conversation);
        if self.token.is_cancelled() {
            return Termination::Cancelled;
        }
        let result = self
            .begin_if_pending(&mut store)
            .and_then(|()| store.error_turn(self.turn_id, reason.clone()));
        match result {
            Ok(()) => Termination::Failed(reason),
            Err(e) => Termination::Detached(e),
        }
    }

    fn begin_if_pending(&self, store: &mut ConversationStore) -> Result<(), DomainError> {
        if store.get(self.turn_id).map(|t| t.status()) == Some(TurnStatus::Pending) {
            store.begin_streaming(self.turn_id)?;
        }
        Ok(())
    }

    fn finish(&self, termination: Termination) -> TurnOutcome {
        {
            let mut active = lock_active(&self.active);
            if active.as_ref().map(|a| a.turn_id) == Some(self.turn_id) {
                *active = None;
            }
        }

        let outcome = {
            let store = lock_store(&self.conversation);
            TurnOutcome::from_store(&store, self.turn_id)
        };

        let failure_label = match &termination {
            Termination::Completed => {
                info!(
                    "Turn {} completed ({} bytes)",
                    self.turn_id,
                    outcome.content.len()
                );
                self.conversation_logger.log(ConversationEvent::new(
                    "turn_completed",
                    json!({
                        "turn_id": self.turn_id.as_u64(),
                        "content": outcome.content,
                    }),
                ));
                return outcome;
            }
            Termination::Failed(reason) => {
                warn!("Turn {} failed: {}", self.turn_id, reason);
                reason.label()
            }
            Termination::Cancelled => {
                debug!("Driver for {} stopped after cancellation", self.turn_id);
                FailureReason::Cancelled.label()
            }
            Termination::Detached(e) => {
                warn!("Turn {} detached from conversation: {}", self.turn_id, e);
                "detached"
            }
        };
        self.conversation_logger.log(ConversationEvent::new(
            "turn_failed",
            json!({
                "turn_id": self.turn_id.as_u64(),
                "reason": failure_label,
                "partial_content": outcome.content,
            }),
        ));
        outcome
    }
}
