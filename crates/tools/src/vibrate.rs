//! Vibrate tool — haptic feedback, gated on a startup-resolved capability.
//!
//! Not every host has a vibrator. The capability is probed once when the
//! tool is constructed; when absent, execute fails fast with a typed
//! capability error instead of probing the platform at call time.

use crate::bridge::DeviceBridge;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use vesper_core::error::ToolError;
use vesper_core::tool::{Tool, ToolOutput};

const DEFAULT_DURATION_MS: u64 = 500;

pub struct VibrateTool {
    haptics: Option<Arc<dyn DeviceBridge>>,
}

impl VibrateTool {
    /// `haptics` is `Some` only when the bridge reported the capability at
    /// startup.
    pub fn new(haptics: Option<Arc<dyn DeviceBridge>>) -> Self {
        Self { haptics }
    }
}

#[async_trait]
impl Tool for VibrateTool {
    fn name(&self) -> &str {
        "vibrate"
    }

    fn description(&self) -> &str {
        "Vibrate the device for a duration in milliseconds (default 500)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "duration_ms": {
                    "type": "integer",
                    "description": "Vibration length in milliseconds"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let Some(bridge) = &self.haptics else {
            return Err(ToolError::CapabilityUnavailable("haptics".into()));
        };

        let duration_ms = arguments["duration_ms"].as_u64().unwrap_or(DEFAULT_DURATION_MS);

        let mut params = HashMap::new();
        params.insert("duration".to_string(), duration_ms.to_string());

        match bridge.execute("VIBRATE", params).await {
            Ok(response) if response.success => {
                Ok(ToolOutput::ok(format!("Vibrated for {duration_ms}ms")))
            }
            Ok(response) => Ok(ToolOutput::fail(response.message)),
            Err(reason) => Err(ToolError::ExecutionFailed {
                tool_name: "vibrate".into(),
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
    async fn vibrates_with_default_duration() {
        let tool = VibrateTool::new(Some(Arc::new(LoopbackBridge::new())));
        let result = tool.execute(serde_json::json!({})).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "Vibrated for 500ms");
    }

    #[tokio::test]
    async fn missing_capability_fails_fast() {
        let tool = VibrateTool::new(None);
        let err = tool
            .execute(serde_json::json!({"duration_ms": 200}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::CapabilityUnavailable(_)));
        assert!(!err.retryable());
    }
}
