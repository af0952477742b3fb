//! Run-level streaming events.
//!
//! `RunEvent` surfaces the reasoning loop's progress (thoughts, actions,
//! observations, raw tokens) to callers over an mpsc channel — the Rust
//! rendition of per-run onThought/onAction/onToken callbacks.

use serde::{Deserialize, Serialize};

/// Events emitted by the orchestrator during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// Partial text token from the model.
    Token { content: String },

    /// A reasoning step the model emitted.
    Thought { content: String },

    /// The loop is invoking a tool.
    Action {
        tool_name: String,
        params: serde_json::Value,
    },

    /// A tool result observed by the loop.
    Observation { content: String, success: bool },

    /// The run is complete.
    Done {
        final_answer: String,
        iterations: u32,
        tokens_used: u32,
    },

    /// An error occurred mid-run.
    Error { message: String },
}

impl RunEvent {
    /// Stable event name for logs and wire protocols.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Token { .. } => "token",
            Self::Thought { .. } => "thought",
            Self::Action { .. } => "action",
            Self::Observation { .. } => "observation",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}
