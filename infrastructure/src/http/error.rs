//! Error types for the HTTP inference adapter

use streamchat_application::GatewayError;
use thiserror::Error;

/// Result type alias for HTTP adapter operations
pub type Result<T> = std::result::Result<T, HttpError>;

/// Errors that can occur when talking to an OpenAI-compatible endpoint
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

impl From<HttpError> for GatewayError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Client(e) if e.is_timeout() => GatewayError::Timeout,
            HttpError::Client(e) => GatewayError::ConnectionError(e.to_string()),
            HttpError::Status { status, body } => GatewayError::RequestFailed { status, body },
            HttpError::InvalidUrl(url) => GatewayError::Other(format!("invalid URL: {}", url)),
        }
    }
}
