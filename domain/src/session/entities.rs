//! Inference session entities

use crate::conversation::turn::{Role, Turn};
use serde::{Deserialize, Serialize};

/// A turn reduced to what the inference endpoint sees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Turn> for Message {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role(),
            content: turn.content().to_string(),
        }
    }
}

/// One outbound request per turn: the ordered transcript plus the backend
/// model identifier resolved from the mode catalog.
///
/// Serializes as `{"transcript": [...], "modelIdentifier": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceRequest {
    pub transcript: Vec<Message>,
    pub model_identifier: String,
}

impl InferenceRequest {
    pub fn new(transcript: Vec<Message>, model_identifier: impl Into<String>) -> Self {
        Self {
            transcript,
            model_identifier: model_identifier.into(),
        }
    }
}
