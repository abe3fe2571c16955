//! Domain error types

use crate::conversation::turn::{TurnId, TurnStatus};
use thiserror::Error;

/// Domain-level errors
///
/// `InvalidRole`, `InvalidTransition` and `UnknownTurn` are state-invariant
/// violations: a correct caller never triggers them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid role: '{0}' (expected user, assistant or system)")]
    InvalidRole(String),

    #[error("Invalid transition for {turn_id}: cannot {action} while {status}")]
    InvalidTransition {
        turn_id: TurnId,
        status: TurnStatus,
        action: &'static str,
    },

    #[error("Unknown turn: {0}")]
    UnknownTurn(TurnId),

    #[error("Unknown mode: '{0}'")]
    UnknownMode(String),

    #[error("Invalid mode catalog: {0}")]
    InvalidCatalog(String),
}

impl DomainError {
    /// Check if this error is a state-machine violation
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidRole(_)
                | DomainError::InvalidTransition { .. }
                | DomainError::UnknownTurn(_)
        )
    }
}
