//! Tool trait — the abstraction over assistant capabilities.
//!
//! Tools are what give the reasoning loop the ability to act on the host:
//! show a notification, launch an app, read the battery level, search the
//! web. Each tool declares a JSON-schema-like parameter schema plus its
//! retry/timeout policy; the registry owns failure isolation and backoff.

use crate::error::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where a tool's implementation lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolSource {
    /// Runs in-process or against the local device bridge.
    Local,
    /// Backed by a remote service.
    Remote,
}

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// The result of a tool execution.
///
/// `retryable = false` marks failures that must not advance the tool's
/// backoff state (the tool was never actually invoked, or retrying cannot
/// help).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Whether the tool executed successfully
    pub success: bool,

    /// Formatted, user/model-readable output text
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Error description when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Whether this failure counts against the retry budget
    #[serde(default = "default_retryable")]
    pub retryable: bool,
}

fn default_retryable() -> bool {
    true
}

impl ToolOutput {
    /// A successful result with formatted output text.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            data: None,
            error: None,
            retryable: true,
        }
    }

    /// A successful result carrying structured data.
    pub fn ok_with_data(output: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::ok(output)
        }
    }

    /// A retryable failure.
    pub fn fail(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            output: format!("Error: {error}"),
            data: None,
            error: Some(error),
            retryable: true,
        }
    }

    /// A failure that must not advance backoff state.
    pub fn fail_fatal(error: impl Into<String>) -> Self {
        Self {
            retryable: false,
            ..Self::fail(error)
        }
    }

    /// Convert a typed tool error into a result value, preserving its
    /// retryability classification.
    pub fn from_error(err: &ToolError) -> Self {
        Self {
            retryable: err.retryable(),
            ..Self::fail(err.to_string())
        }
    }
}

/// A tool descriptor for prompt construction and observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,

    /// Whether the tool needs network connectivity
    pub requires_network: bool,
}

impl ToolDescriptor {
    /// Render this descriptor as a single system-prompt line:
    /// `name(param: type, …): description`.
    pub fn prompt_line(&self) -> String {
        let mut params: Vec<String> = Vec::new();
        if let Some(props) = self.parameters.get("properties").and_then(|p| p.as_object()) {
            let mut names: Vec<&String> = props.keys().collect();
            names.sort();
            for name in names {
                let ty = props[name]
                    .get("type")
                    .and_then(|t| t.as_str())
                    .unwrap_or("string");
                params.push(format!("{name}: {ty}"));
            }
        }
        format!("{}({}): {}", self.name, params.join(", "), self.description)
    }
}

/// The core Tool trait.
///
/// Each capability (show_toast, open_app, battery_status, web_search, …)
/// implements this trait. Tools are registered in the ToolRegistry and made
/// available to the reasoning loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "show_toast", "open_app").
    fn name(&self) -> &str;

    /// A description of what this tool does (interpolated into the prompt).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolOutput, ToolError>;

    /// Where this tool's implementation lives.
    fn source(&self) -> ToolSource {
        ToolSource::Local
    }

    /// Whether the tool needs network connectivity.
    fn requires_network(&self) -> bool {
        false
    }

    /// Failures allowed before the tool is exhausted and hidden from prompts.
    fn max_retries(&self) -> u32 {
        2
    }

    /// Per-call execution deadline.
    fn timeout(&self) -> Duration {
        Duration::from_millis(5000)
    }

    /// Convert this tool into a descriptor for prompts and status output.
    fn to_descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
            requires_network: self.requires_network(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_constructors() {
        let ok = ToolOutput::ok("done");
        assert!(ok.success);
        assert!(ok.error.is_none());

        let fail = ToolOutput::fail("boom");
        assert!(!fail.success);
        assert!(fail.retryable);
        assert_eq!(fail.error.as_deref(), Some("boom"));

        let fatal = ToolOutput::fail_fatal("no such tool");
        assert!(!fatal.retryable);
    }

    #[test]
    fn from_error_preserves_retryability() {
        let out = ToolOutput::from_error(&ToolError::NotFound("ghost".into()));
        assert!(!out.success);
        assert!(!out.retryable);

        let out = ToolOutput::from_error(&ToolError::Timeout {
            tool_name: "slow".into(),
            timeout_ms: 5000,
        });
        assert!(out.retryable);
    }

    #[test]
    fn prompt_line_renders_params() {
        let desc = ToolDescriptor {
            name: "show_toast".into(),
            description: "Display a toast message".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string", "description": "Text to show" }
                },
                "required": ["message"]
            }),
            requires_network: false,
        };
        assert_eq!(
            desc.prompt_line(),
            "show_toast(message: string): Display a toast message"
        );
    }

    #[test]
    fn prompt_line_no_params() {
        let desc = ToolDescriptor {
            name: "battery_status".into(),
            description: "Read the battery level".into(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
            requires_network: false,
        };
        assert_eq!(
            desc.prompt_line(),
            "battery_status(): Read the battery level"
        );
    }

    #[test]
    fn retryable_deserialization_default() {
        let json = r#"{"success": false, "output": "Error: x", "error": "x"}"#;
        let out: ToolOutput = serde_json::from_str(json).unwrap();
        assert!(out.retryable);
    }
}
