//! Infrastructure layer for streamchat
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod http;
pub mod logging;

// Re-export commonly used types
pub use config::{
    ConfigLoader, FileConfig, FileLoggingConfig, FileProviderConfig, FileReplConfig,
    FileStreamConfig,
};
pub use http::{HttpError, HttpGatewayConfig, HttpInferenceGateway};
pub use logging::JsonlConversationLogger;
