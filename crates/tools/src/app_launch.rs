//! App launch tool — opens an application on the device.

use crate::bridge::DeviceBridge;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use vesper_core::error::ToolError;
use vesper_core::tool::{Tool, ToolOutput};

pub struct AppLaunchTool {
    bridge: Arc<dyn DeviceBridge>,
}

impl AppLaunchTool {
    pub fn new(bridge: Arc<dyn DeviceBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for AppLaunchTool {
    fn name(&self) -> &str {
        "open_app"
    }

    fn description(&self) -> &str {
        "Launch an application on the device by name or package identifier."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "App name or package identifier, e.g. 'camera' or 'com.android.settings'"
                }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let name = arguments["name"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'name' argument".into()))?;

        let mut params = HashMap::new();
        params.insert("package".to_string(), name.to_string());

        match self.bridge.execute("LAUNCH_APP", params).await {
            Ok(response) if response.success => Ok(ToolOutput::ok_with_data(
                format!("Opened {name}"),
                response.data,
            )),
            Ok(response) => Ok(ToolOutput::fail(response.message)),
            Err(reason) => Err(ToolError::ExecutionFailed {
                tool_name: "open_app".into(),
                reason,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::LoopbackBridge;

    #[tokio::test]
    async fn launches_app() {
        let tool = AppLaunchTool::new(Arc::new(LoopbackBridge::new()));
        let result = tool
            .execute(serde_json::json!({"name": "camera"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "Opened camera");
    }
}
