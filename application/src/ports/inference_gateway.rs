//! Inference Gateway port
//!
//! Defines the interface for opening a streaming inference request.

use async_trait::async_trait;
use streamchat_domain::{FailureReason, InferenceRequest, StreamEvent};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur while opening a stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    /// Classify this error for an errored assistant turn.
    ///
    /// Non-2xx responses are remote errors; everything the endpoint did not
    /// explicitly report is unknown.
    pub fn failure_reason(&self) -> FailureReason {
        match self {
            GatewayError::RequestFailed { status, body } => {
                if body.is_empty() {
                    FailureReason::RemoteError(format!("HTTP {}", status))
                } else {
                    FailureReason::RemoteError(format!("HTTP {}: {}", status, body))
                }
            }
            GatewayError::Timeout => FailureReason::Timeout,
            GatewayError::ConnectionError(msg) | GatewayError::Other(msg) => {
                FailureReason::Unknown(msg.clone())
            }
        }
    }
}

/// Handle for receiving streaming events for one request.
///
/// Dropping the handle closes the underlying transport.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Next event, or `None` once the transport side has gone away.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }
}

/// Gateway for streaming inference
///
/// This port defines how the application layer talks to a model endpoint.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Open one streaming request. Events arrive in order on the returned
    /// handle and end with exactly one terminal event.
    async fn open_stream(&self, request: InferenceRequest) -> Result<StreamHandle, GatewayError>;
}
