//! Battery status tool.

use crate::bridge::DeviceBridge;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use vesper_core::error::ToolError;
use vesper_core::tool::{Tool, ToolOutput};

pub struct BatteryTool {
    bridge: Arc<dyn DeviceBridge>,
}

impl BatteryTool {
    pub fn new(bridge: Arc<dyn DeviceBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for BatteryTool {
    fn name(&self) -> &str {
        "battery_status"
    }

    fn description(&self) -> &str {
        "Get the current battery level and charging status."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        match self.bridge.execute("QUERY_BATTERY", HashMap::new()).await {
            Ok(response) if response.success => {
                let level = response.data["level"].as_u64();
                let charging = response.data["charging"].as_bool().unwrap_or(false);
                let formatted = match level {
                    Some(level) if charging => format!("Battery at {level}%, charging"),
                    Some(level) => format!("Battery at {level}%"),
                    None => response.message.clone(),
                };
                Ok(ToolOutput::ok_with_data(formatted, response.data))
            }
            Ok(response) => Ok(ToolOutput::fail(response.message)),
            Err(reason) => Err(ToolError::ExecutionFailed {
                tool_name: "battery_status".into(),
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
    async fn reads_battery_level() {
        let tool = BatteryTool::new(Arc::new(LoopbackBridge::new()));
        let result = tool.execute(serde_json::json!({})).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "Battery at 85%");
        assert_eq!(result.data.unwrap()["level"], 85);
    }
}
