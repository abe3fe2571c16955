//! Conversation domain.
//!
//! - [`turn::Turn`]: one message with its streaming lifecycle
//! - [`store::ConversationStore`]: ordered turns of one session
//! - [`observer::ConversationObserver`]: mutation notifications

pub mod observer;
pub mod store;
pub mod turn;

#[cfg(test)]
mod proptests;
