//! Toast tool — displays a transient message on the device screen.

use crate::bridge::DeviceBridge;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use vesper_core::error::ToolError;
use vesper_core::tool::{Tool, ToolOutput};

pub struct ToastTool {
    bridge: Arc<dyn DeviceBridge>,
}

impl ToastTool {
    pub fn new(bridge: Arc<dyn DeviceBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for ToastTool {
    fn name(&self) -> &str {
        "show_toast"
    }

    fn description(&self) -> &str {
        "Display a temporary toast message on the device screen."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The text to display"
                }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let message = arguments["message"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'message' argument".into()))?;

        let mut params = HashMap::new();
        params.insert("message".to_string(), message.to_string());

        match self.bridge.execute("TOAST", params).await {
            Ok(response) if response.success => Ok(ToolOutput::ok_with_data(
                format!("Toast shown: {message}"),
                response.data,
            )),
            Ok(response) => Ok(ToolOutput::fail(response.message)),
            Err(reason) => Err(ToolError::ExecutionFailed {
                tool_name: "show_toast".into(),
                reason,
            }),
        }
    }
}
