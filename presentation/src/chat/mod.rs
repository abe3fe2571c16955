//! Interactive chat module
//!
//! Provides a readline-based interactive chat interface.

mod repl;

pub use repl::{ChatRepl, ReplCommand, resolve_history_path, wait_with_interrupt};
