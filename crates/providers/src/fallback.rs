//! Backend fallback — ordered chain with per-backend timeouts.
//!
//! The reasoning loop is configured with one `FallbackBackend` whose chain
//! lists backends in preference order (typically remote first, local
//! second). When a backend fails or times out, the next one in the chain is
//! tried; the state machine upstream never knows which backend answered.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use vesper_core::backend::{ChatReply, ChatRequest, InferenceBackend, TokenChunk};
use vesper_core::error::BackendError;

/// A backend that wraps an ordered list of backends and falls back on
/// failure.
pub struct FallbackBackend {
    name: String,
    chain: Vec<FallbackEntry>,
}

/// A single entry in the fallback chain.
struct FallbackEntry {
    backend: Arc<dyn InferenceBackend>,
    timeout: Duration,
}

impl FallbackBackend {
    /// Create a new fallback backend with no entries.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain: Vec::new(),
        }
    }

    /// Add a backend to the chain with a custom timeout.
    pub fn add(mut self, backend: Arc<dyn InferenceBackend>, timeout: Duration) -> Self {
        self.chain.push(FallbackEntry { backend, timeout });
        self
    }

    /// Add a backend with the default timeout (120s).
    pub fn add_default(self, backend: Arc<dyn InferenceBackend>) -> Self {
        self.add(backend, Duration::from_secs(120))
    }

    /// Number of backends in the chain.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

#[async_trait]
impl InferenceBackend for FallbackBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, BackendError> {
        let mut last_error =
            BackendError::NotConfigured("No backends in fallback chain".into());

        for (i, entry) in self.chain.iter().enumerate() {
            let backend_name = entry.backend.name().to_string();

            info!(
                backend = %backend_name,
                attempt = i + 1,
                total = self.chain.len(),
                "Fallback: trying backend"
            );

            match tokio::time::timeout(entry.timeout, entry.backend.chat(request.clone())).await
            {
                Ok(Ok(reply)) => return Ok(reply),
                Ok(Err(e)) => {
                    warn!(
                        backend = %backend_name,
                        error = %e,
                        "Fallback: backend failed, trying next"
                    );
                    last_error = e;
                }
                Err(_) => {
                    warn!(
                        backend = %backend_name,
                        timeout_secs = entry.timeout.as_secs(),
                        "Fallback: backend timed out, trying next"
                    );
                    last_error = BackendError::Timeout(format!(
                        "Backend '{}' timed out after {}s",
                        backend_name,
                        entry.timeout.as_secs()
                    ));
                }
            }
        }

        Err(last_error)
    }

    async fn chat_stream(
        &self,
        request: ChatRequest,
    ) -> Result<
        tokio::sync::mpsc::Receiver<Result<TokenChunk, BackendError>>,
        BackendError,
    > {
        let mut last_error =
            BackendError::NotConfigured("No backends in fallback chain".into());

        for entry in &self.chain {
            match tokio::time::timeout(
                entry.timeout,
                entry.backend.chat_stream(request.clone()),
            )
            .await
            {
                Ok(Ok(rx)) => return Ok(rx),
                Ok(Err(e)) => {
                    warn!(
                        backend = %entry.backend.name(),
                        error = %e,
                        "Fallback: backend stream failed, trying next"
                    );
                    last_error = e;
                }
                Err(_) => {
                    last_error = BackendError::Timeout(format!(
                        "Backend '{}' stream timed out after {}s",
                        entry.backend.name(),
                        entry.timeout.as_secs()
                    ));
                }
            }
        }

        Err(last_error)
    }

    async fn health_check(&self) -> bool {
        for entry in &self.chain {
            if entry.backend.health_check().await {
                return true;
            }
        }
        false
    }
}
