//! Presentation layer for streamchat
//!
//! This crate contains CLI definitions, transcript formatting, live
//! rendering of streaming turns, and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatRepl, wait_with_interrupt};
pub use cli::commands::Cli;
pub use output::console::ConsoleFormatter;
pub use progress::reporter::StreamReporter;
