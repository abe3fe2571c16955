//! Core domain concepts shared across all subdomains.
//!
//! - [`prompt::UserPrompt`]: validated user input for a new turn
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod prompt;
