//! HTTP implementation of the InferenceGateway port
//!
//! Sends one streaming chat-completions request per turn and forwards the
//! decoded SSE body as [`StreamEvent`]s from a spawned task. The task stops
//! reading as soon as the receiving [`StreamHandle`] is dropped, which drops
//! the response body and closes the connection.

use super::error::{HttpError, Result};
use super::protocol::{ChatCompletionChunk, ChatCompletionRequest};
use super::sse::SseDecoder;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::time::Duration;
use streamchat_application::{GatewayError, InferenceGateway, StreamHandle};
use streamchat_domain::util::truncate_str;
use streamchat_domain::{InferenceRequest, StreamEvent, StreamFailure};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Buffered events between the body reader and the turn driver.
const CHANNEL_CAPACITY: usize = 64;

/// Longest error body kept from a non-2xx response.
const MAX_ERROR_BODY: usize = 2048;

/// Connection settings for [`HttpInferenceGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpGatewayConfig {
    pub base_url: String,
    pub path: String,
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
}

impl HttpGatewayConfig {
    /// Full request URL: `base_url` and `path` joined by exactly one slash.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

/// Gateway to an OpenAI-compatible streaming endpoint.
pub struct HttpInferenceGateway {
    client: reqwest::Client,
    config: HttpGatewayConfig,
}

impl HttpInferenceGateway {
    pub fn new(config: HttpGatewayConfig) -> Result<Self> {
        let endpoint = config.endpoint();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(HttpError::InvalidUrl(endpoint));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpGatewayConfig {
        &self.config
    }

    async fn send(&self, request: &InferenceRequest) -> Result<reqwest::Response> {
        let mut builder = self
            .client
            .post(self.config.endpoint())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&ChatCompletionRequest::streaming(request));
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::Status {
                status: status.as_u16(),
                body: truncate_str(body.trim(), MAX_ERROR_BODY).to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl InferenceGateway for HttpInferenceGateway {
    async fn open_stream(
        &self,
        request: InferenceRequest,
    ) -> std::result::Result<StreamHandle, GatewayError> {
        info!(
            "Opening stream: model={}, {} messages",
            request.model_identifier,
            request.transcript.len()
        );

        let response = self.send(&request).await.map_err(|e| {
            warn!("Stream request failed: {}", e);
            GatewayError::from(e)
        })?;
        debug!("Stream accepted with status {}", response.status());

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(forward(response.bytes_stream(), tx));
        Ok(StreamHandle::new(rx))
    }
}

// ==================== Body decoding ====================

/// Turns SSE data payloads into stream events.
///
/// `[DONE]` is terminal. A `finish_reason` is remembered so that a body
/// ending without `[DONE]` still counts as completed.
#[derive(Debug, Default)]
pub(crate) struct ChatStreamDecoder {
    finish_reason: Option<String>,
    done: bool,
}

impl ChatStreamDecoder {
    pub(crate) fn is_done(&self) -> bool {
        self.done
    }

    pub(crate) fn decode(&mut self, data: &str) -> Option<StreamEvent> {
        if self.done {
            return None;
        }
        let data = data.trim();
        if data == "[DONE]" {
            self.done = true;
            return Some(StreamEvent::Completed);
        }

        let chunk: ChatCompletionChunk = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                self.done = true;
                return Some(StreamEvent::Error(StreamFailure::Transport(format!(
                    "malformed chunk: {}",
                    e
                ))));
            }
        };

        if let Some(message) = chunk.error_message() {
            self.done = true;
            return Some(StreamEvent::Error(StreamFailure::Remote(message)));
        }
        if let Some(reason) = chunk.finish_reason() {
            trace!("finish_reason={}", reason);
            self.finish_reason = Some(reason.to_string());
        }
        chunk
            .content()
            .map(|text| StreamEvent::Delta(text.to_string()))
    }

    /// Terminal event for a body that ended without `[DONE]`.
    pub(crate) fn end_of_stream(&mut self) -> Option<StreamEvent> {
        if self.done {
            return None;
        }
        self.done = true;
        Some(match self.finish_reason {
            Some(_) => StreamEvent::Completed,
            None => StreamEvent::Error(StreamFailure::Transport(
                "stream ended without terminal signal".to_string(),
            )),
        })
    }
}

/// Read `body` until a terminal event is sent or `tx`'s receiver is dropped.
pub(crate) async fn forward<S, B, E>(body: S, tx: mpsc::Sender<StreamEvent>)
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut body = std::pin::pin!(body);
    let mut sse = SseDecoder::new();
    let mut chat = ChatStreamDecoder::default();

    while !chat.is_done() {
        let chunk = tokio::select! {
            _ = tx.closed() => {
                debug!("Stream receiver dropped, closing connection");
                return;
            }
            chunk = body.next() => chunk,
        };

        let events: Vec<StreamEvent> = match chunk {
            Some(Ok(bytes)) => sse
                .push(bytes.as_ref())
                .iter()
                .filter_map(|data| chat.decode(data))
                .collect(),
            Some(Err(e)) => {
                warn!("Stream body error: {}", e);
                chat.done = true;
                vec![StreamEvent::Error(StreamFailure::Transport(e.to_string()))]
            }
            None => {
                let mut events: Vec<StreamEvent> = sse
                    .finish()
                    .iter()
                    .filter_map(|data| chat.decode(data))
                    .collect();
                events.extend(chat.end_of_stream());
                events
            }
        };

        for event in events {
            let terminal = event.is_terminal();
            if tx.send(event).await.is_err() {
                return;
            }
            if terminal {
                return;
            }
        }
    }
}
