//! Streaming events for inference responses.
//!
//! [`StreamEvent`] is what a transport delivers, in order, for one request:
//! any number of [`Delta`](StreamEvent::Delta)s followed by exactly one
//! terminal event ([`Completed`](StreamEvent::Completed) or
//! [`Error`](StreamEvent::Error)).

use crate::conversation::turn::FailureReason;

/// Transport-level failure classification carried by [`StreamEvent::Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFailure {
    /// The endpoint sent an explicit error (payload or HTTP status).
    Remote(String),
    /// Connection dropped, malformed framing, or premature end of stream.
    Transport(String),
}

impl StreamFailure {
    pub fn message(&self) -> &str {
        match self {
            StreamFailure::Remote(msg) | StreamFailure::Transport(msg) => msg,
        }
    }
}

impl From<StreamFailure> for FailureReason {
    fn from(failure: StreamFailure) -> Self {
        match failure {
            StreamFailure::Remote(msg) => FailureReason::RemoteError(msg),
            StreamFailure::Transport(msg) => FailureReason::Unknown(msg),
        }
    }
}

/// An event in a streaming inference response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text fragment from the model.
    Delta(String),
    /// The stream ended successfully.
    Completed,
    /// The stream ended with an error.
    Error(StreamFailure),
}

impl StreamEvent {
    /// Returns the text content if this is a Delta event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed | StreamEvent::Error(_))
    }
}
