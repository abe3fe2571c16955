//! Application layer for streamchat
//!
//! This crate contains the turn streaming controller, the ports it drives,
//! and application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::StreamSettings;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    inference_gateway::{GatewayError, InferenceGateway, StreamHandle},
};
pub use use_cases::submit_turn::{
    SharedConversation, SubmitTurnError, TurnCanceller, TurnController, TurnHandle, TurnOutcome,
};
