//! Shared chat-completions wire format.
//!
//! Both the remote and local backends speak the OpenAI-style
//! `/chat/completions` shape; this module holds the request/response DTOs
//! and the translation from our domain types.

use serde::{Deserialize, Serialize};
use vesper_core::backend::ChatRequest;
use vesper_core::error::BackendError;
use vesper_core::message::Role;

#[derive(Debug, Serialize)]
pub(crate) struct ApiMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    pub choices: Vec<ApiChoice>,
    #[serde(default)]
    pub usage: Option<ApiUsage>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiChoice {
    pub message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiUsage {
    #[serde(default)]
    pub total_tokens: u32,
}

/// A single SSE chunk in a streaming response.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiStreamChunk {
    pub choices: Vec<ApiStreamChoice>,
    #[serde(default)]
    pub usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiStreamChoice {
    pub delta: ApiDelta,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct ApiDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// Build the request body: system prompt first, then conversation turns.
pub(crate) fn build_body(model: &str, request: &ChatRequest, stream: bool) -> serde_json::Value {
    let mut messages = vec![ApiMessage {
        role: "system",
        content: request.system_prompt.clone(),
    }];
    messages.extend(request.messages.iter().map(|m| ApiMessage {
        role: match m.role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        },
        content: m.content.clone(),
    }));

    let mut body = serde_json::json!({
        "model": model,
        "messages": messages,
        "temperature": request.temperature,
        "stream": stream,
    });
    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = serde_json::json!(max_tokens);
    }
    body
}

/// Map a non-200 HTTP status to a typed backend error.
pub(crate) fn error_for_status(status: u16, body: String) -> BackendError {
    match status {
        429 => BackendError::RateLimited {
            retry_after_secs: 5,
        },
        401 | 403 => BackendError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ),
        _ => BackendError::ApiError {
            status_code: status,
            message: body,
        },
    }
}

/// Fallback token estimate when the backend reports no usage:
/// ~4 characters per token across the whole exchange.
pub(crate) fn estimate_tokens(request: &ChatRequest, reply_text: &str) -> u32 {
    let prompt_chars: usize = request.system_prompt.len()
        + request
            .messages
            .iter()
            .map(|m| m.content.len())
            .sum::<usize>();
    ((prompt_chars + reply_text.len()).div_ceil(4)) as u32
}
