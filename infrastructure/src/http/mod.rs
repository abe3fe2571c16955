//! HTTP adapter for OpenAI-compatible streaming chat completions.
//!
//! - [`gateway::HttpInferenceGateway`]: implements `InferenceGateway`
//! - [`sse::SseDecoder`]: incremental server-sent events framing
//! - [`protocol`]: request and chunk wire types

pub mod error;
pub mod gateway;
pub mod protocol;
pub mod sse;

pub use error::HttpError;
pub use gateway::{HttpGatewayConfig, HttpInferenceGateway};
