//! Turn entity and its lifecycle types

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier of a turn, unique within its conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TurnId(u64);

impl TurnId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn-{}", self.0)
    }
}

/// Role of a turn in a conversation (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            other => Err(DomainError::InvalidRole(other.to_string())),
        }
    }
}

/// Lifecycle status of a turn.
///
/// Only assistant turns ever leave `Complete`; user and system turns are
/// created complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    Pending,
    Streaming,
    Complete,
    Errored,
}

impl TurnStatus {
    /// Returns true for `Complete` and `Errored`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnStatus::Complete | TurnStatus::Errored)
    }

    /// Returns true for `Pending` and `Streaming`.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, TurnStatus::Pending | TurnStatus::Streaming)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TurnStatus::Pending => "pending",
            TurnStatus::Streaming => "streaming",
            TurnStatus::Complete => "complete",
            TurnStatus::Errored => "errored",
        }
    }
}

impl fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an assistant turn ended in `Errored`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FailureReason {
    /// No chunk or terminal signal arrived within the inactivity window.
    Timeout,
    /// The caller invoked the cancellation handle.
    Cancelled,
    /// The inference endpoint reported an error.
    RemoteError(String),
    /// Connection, decoding or framing failure.
    Unknown(String),
}

impl FailureReason {
    /// Short machine-readable label (`timeout`, `cancelled`, ...).
    pub fn label(&self) -> &'static str {
        match self {
            FailureReason::Timeout => "timeout",
            FailureReason::Cancelled => "cancelled",
            FailureReason::RemoteError(_) => "remote_error",
            FailureReason::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Timeout => f.write_str("timed out waiting for the model"),
            FailureReason::Cancelled => f.write_str("cancelled"),
            FailureReason::RemoteError(msg) => write!(f, "remote error: {}", msg),
            FailureReason::Unknown(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

/// One message in a conversation (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    id: TurnId,
    role: Role,
    content: String,
    status: TurnStatus,
    failure: Option<FailureReason>,
}

impl Turn {
    /// A user or system turn is born complete; an assistant turn starts
    /// pending with an empty buffer.
    pub(crate) fn new(id: TurnId, role: Role, content: String) -> Self {
        let status = match role {
            Role::Assistant => TurnStatus::Pending,
            Role::User | Role::System => TurnStatus::Complete,
        };
        Self {
            id,
            role,
            content,
            status,
            failure: None,
        }
    }

    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn status(&self) -> TurnStatus {
        self.status
    }

    /// Set only when `status` is `Errored`.
    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    pub(crate) fn push_content(&mut self, text: &str) {
        self.content.push_str(text);
    }

    pub(crate) fn set_status(&mut self, status: TurnStatus) {
        self.status = status;
    }

    pub(crate) fn set_failure(&mut self, reason: FailureReason) {
        self.status = TurnStatus::Errored;
        self.failure = Some(reason);
    }
}
