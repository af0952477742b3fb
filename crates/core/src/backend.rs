//! InferenceBackend trait — the abstraction over language-model backends.
//!
//! A backend knows how to send a conversation to a model and get text back,
//! either as a complete reply or as a stream of tokens. The reasoning loop
//! treats the model as an opaque request/response function: weight loading
//! and inference internals live behind this trait.
//!
//! Implementations: remote OpenAI-compatible endpoints, a constrained local
//! server, and an ordered fallback chain over both.

use crate::error::BackendError;
use crate::message::ChatMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A chat request sent to a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// System prompt (instruction template + tool list)
    pub system_prompt: String,

    /// The conversation messages, oldest first
    pub messages: Vec<ChatMessage>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

impl ChatRequest {
    pub fn new(system_prompt: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages,
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

/// A complete (non-streaming) reply from a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    /// The generated text
    pub text: String,

    /// Total token estimate for the exchange (prompt + completion)
    pub tokens_used: u32,

    /// Which model actually responded
    pub model: String,
}

/// A single chunk in a streaming reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenChunk {
    /// Partial content delta
    #[serde(default)]
    pub content: Option<String>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,

    /// Token estimate (typically only on the final chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

/// The core inference backend trait.
///
/// A failed backend is data, not a panic: the orchestrator maps any
/// `BackendError` into a "model unavailable" outcome for the user.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// A human-readable name for this backend (e.g., "remote", "local").
    fn name(&self) -> &str;

    /// Send a request and get a complete reply.
    async fn chat(
        &self,
        request: ChatRequest,
    ) -> std::result::Result<ChatReply, BackendError>;

    /// Send a request and get a stream of reply chunks.
    ///
    /// Default implementation calls `chat()` and wraps the result as a
    /// single chunk.
    async fn chat_stream(
        &self,
        request: ChatRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<TokenChunk, BackendError>>,
        BackendError,
    > {
        let reply = self.chat(request).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx
            .send(Ok(TokenChunk {
                content: Some(reply.text),
                done: true,
                tokens_used: Some(reply.tokens_used),
            }))
            .await;
        Ok(rx)
    }

    /// Health check — can we reach the backend?
    async fn health_check(&self) -> bool {
        true
    }
}
