//! Domain layer for streamchat
//!
//! This crate contains the conversation model, its state machine and the
//! mode catalog. It has no dependencies on infrastructure or presentation
//! concerns.
//!
//! # Core Concepts
//!
//! ## Conversation Store
//!
//! A [`ConversationStore`] holds the ordered [`Turn`]s of one chat session.
//! Assistant turns move through a strict lifecycle while a response streams in:
//!
//! ```text
//! pending ──▶ streaming ──▶ complete
//!                      └──▶ errored(reason)
//! ```
//!
//! At most one turn per conversation is `streaming` at any time, and every
//! mutation is announced to registered [`ConversationObserver`]s.
//!
//! ## Mode Catalog
//!
//! A [`ModeCatalog`] maps human-readable mode keys (`default`, `fast`, ...)
//! to backend model identifiers. A [`ModeKey`] can only be obtained by
//! resolving against a catalog, so unknown modes never reach the network.

pub mod config;
pub mod conversation;
pub mod core;
pub mod mode;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use config::validation::{ConfigIssue, ConfigIssueCode, Severity};
pub use conversation::{
    observer::{ConversationObserver, MutationEvent, MutationKind, SubscriptionId},
    store::ConversationStore,
    turn::{FailureReason, Role, Turn, TurnId, TurnStatus},
};
pub use core::{error::DomainError, prompt::UserPrompt};
pub use mode::catalog::{ModeCatalog, ModeKey, ResolvedMode};
pub use session::{
    entities::{InferenceRequest, Message},
    stream::{StreamEvent, StreamFailure},
};
