//! Wire types for OpenAI-compatible chat completions.
//!
//! Only the fields the adapter reads or writes are modelled; everything else
//! in a chunk is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use streamchat_domain::{InferenceRequest, Message};

/// Request body for `POST /v1/chat/completions`
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub stream: bool,
}

impl<'a> ChatCompletionRequest<'a> {
    pub fn streaming(request: &'a InferenceRequest) -> Self {
        Self {
            model: &request.model_identifier,
            messages: &request.transcript,
            stream: true,
        }
    }
}

/// One `data:` payload of a streamed completion
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    /// `{"message": "..."}` object, or occasionally a bare string.
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Text delta of the first choice, if non-empty.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
            .filter(|s| !s.is_empty())
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.finish_reason.as_deref())
    }

    /// Human-readable message of an error payload.
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(
                other
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| other.to_string()),
            ),
        }
    }
}
