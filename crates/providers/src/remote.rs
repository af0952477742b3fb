//! Remote inference backend.
//!
//! Works with any OpenAI-compatible `/v1/chat/completions` endpoint
//! (OpenAI, OpenRouter, Together, vLLM, …). Supports non-streaming chat
//! and streaming SSE for token callbacks.

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, warn};
use vesper_core::backend::{ChatReply, ChatRequest, InferenceBackend, TokenChunk};
use vesper_core::error::BackendError;

use crate::wire;

/// A remote OpenAI-compatible backend.
pub struct RemoteBackend {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl RemoteBackend {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "remote".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl InferenceBackend for RemoteBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, BackendError> {
        let body = wire::build_body(&self.model, &request, false);
        debug!(backend = %self.name, model = %self.model, "Sending chat request");

        let response = self
            .client
            .post(self.url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Backend returned error");
            return Err(wire::error_for_status(status, error_body));
        }

        let api_response: wire::ApiResponse =
            response.json().await.map_err(|e| BackendError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let text = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BackendError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        let tokens_used = api_response
            .usage
            .map(|u| u.total_tokens)
            .unwrap_or_else(|| wire::estimate_tokens(&request, &text));

        Ok(ChatReply {
            text,
            tokens_used,
            model: api_response.model.unwrap_or_else(|| self.model.clone()),
        })
    }

    async fn chat_stream(
        &self,
        request: ChatRequest,
    ) -> Result<
        tokio::sync::mpsc::Receiver<Result<TokenChunk, BackendError>>,
        BackendError,
    > {
        let body = wire::build_body(&self.model, &request, true);

        let response = self
            .client
            .post(self.url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(wire::error_for_status(status, error_body));
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();
            let mut tokens_used = None;

            while let Some(chunk) = stream.next().await {
                let bytes = match chunk {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(BackendError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // Process complete SSE lines, keeping any partial tail.
                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim().to_string();
                    buffer.drain(..=newline);

                    let Some(data) = line.strip_prefix("data:").map(str::trim) else {
                        continue;
                    };
                    if data == "[DONE]" {
                        let _ = tx
                            .send(Ok(TokenChunk {
                                content: None,
                                done: true,
                                tokens_used,
                            }))
                            .await;
                        return;
                    }
                    match serde_json::from_str::<wire::ApiStreamChunk>(data) {
                        Ok(parsed) => {
                            if let Some(usage) = parsed.usage {
                                tokens_used = Some(usage.total_tokens);
                            }
                            let content = parsed
                                .choices
                                .into_iter()
                                .next()
                                .and_then(|c| c.delta.content);
                            if content.is_some()
                                && tx
                                    .send(Ok(TokenChunk {
                                        content,
                                        done: false,
                                        tokens_used: None,
                                    }))
                                    .await
                                    .is_err()
                            {
                                return;
                            }
                        }
                        Err(e) => {
                            debug!(error = %e, "Skipping unparseable SSE chunk");
                        }
                    }
                }
            }

            // Stream ended without [DONE]
            let _ = tx
                .send(Ok(TokenChunk {
                    content: None,
                    done: true,
                    tokens_used,
                }))
                .await;
        });

        Ok(rx)
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/models", self.base_url);
        match self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash() {
        let backend = RemoteBackend::new("https://api.example.com/v1/", "key", "model-a");
        assert_eq!(backend.url(), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn backend_name() {
        let backend = RemoteBackend::new("https://api.example.com/v1", "key", "model-a");
        assert_eq!(backend.name(), "remote");
    }
}
