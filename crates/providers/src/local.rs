//! Local inference backend.
//!
//! Talks to a local llama-server/Ollama-style process over the same
//! OpenAI-compatible wire format — no auth, small context window. Model
//! loading and inference internals live in that server process; this is
//! plumbing only. Replies are capped to a conservative completion length
//! when the caller doesn't set one, since local models run on a tight
//! context budget.

use async_trait::async_trait;
use tracing::debug;
use vesper_core::backend::{ChatReply, ChatRequest, InferenceBackend, TokenChunk};
use vesper_core::error::BackendError;

use crate::remote::RemoteBackend;

/// Default completion cap for the constrained local model.
const LOCAL_MAX_TOKENS: u32 = 256;

/// A constrained local backend (llama-server / Ollama style).
pub struct LocalBackend {
    name: String,
    inner: RemoteBackend,
}

impl LocalBackend {
    /// Create a local backend. `base_url` defaults to Ollama's
    /// OpenAI-compatible endpoint when `None`.
    pub fn new(base_url: Option<&str>, model: impl Into<String>) -> Self {
        let base_url = base_url.unwrap_or("http://localhost:11434/v1");
        Self {
            name: "local".into(),
            // Local servers ignore the bearer token; "local" is a placeholder.
            inner: RemoteBackend::new(base_url, "local", model),
        }
    }

    fn constrain(&self, mut request: ChatRequest) -> ChatRequest {
        if request.max_tokens.is_none() {
            request.max_tokens = Some(LOCAL_MAX_TOKENS);
        }
        request
    }
}

#[async_trait]
impl InferenceBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, BackendError> {
        debug!(backend = %self.name, "Local chat request");
        self.inner.chat(self.constrain(request)).await
    }

    async fn chat_stream(
        &self,
        request: ChatRequest,
    ) -> Result<
        tokio::sync::mpsc::Receiver<Result<TokenChunk, BackendError>>,
        BackendError,
    > {
        self.inner.chat_stream(self.constrain(request)).await
    }

    async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_is_ollama() {
        let backend = LocalBackend::new(None, "qwen2.5:3b");
        assert_eq!(backend.name(), "local");
    }

    #[test]
    fn constrains_missing_max_tokens() {
        let backend = LocalBackend::new(None, "qwen2.5:3b");
        let request = ChatRequest::new("sys", vec![]);
        assert_eq!(backend.constrain(request).max_tokens, Some(LOCAL_MAX_TOKENS));

        let mut request = ChatRequest::new("sys", vec![]);
        request.max_tokens = Some(512);
        assert_eq!(backend.constrain(request).max_tokens, Some(512));
    }
}
