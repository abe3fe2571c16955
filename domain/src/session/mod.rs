//! Inference session domain.
//!
//! - [`entities::Message`]: a turn as sent over the wire
//! - [`entities::InferenceRequest`]: transcript + model identifier
//! - [`stream::StreamEvent`]: incremental response events

pub mod entities;
pub mod stream;
