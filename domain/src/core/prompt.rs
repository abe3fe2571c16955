//! User prompt value object

use serde::{Deserialize, Serialize};

/// Text a user submits to start a new turn (Value Object)
///
/// Guaranteed to contain at least one non-whitespace character. The text is
/// stored exactly as typed; trimming is only used for the emptiness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPrompt {
    content: String,
}

impl UserPrompt {
    /// Try to create a prompt, returning None if it is empty after trimming
    pub fn try_new(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            None
        } else {
            Some(Self { content })
        }
    }

    /// Get the prompt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for UserPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}
