//! Device bridge port — the narrow contract to the host platform.
//!
//! The host (the surrounding application) implements `DeviceBridge` over
//! whatever transport it has: an IPC bridge, a platform API shim, a test
//! double. Tools only depend on the `execute(intent, params)` shape and a
//! startup capability probe.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The response to a bridge command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// The host-platform port consumed by device tools.
#[async_trait]
pub trait DeviceBridge: Send + Sync {
    /// Execute a device command. Must return within the caller's declared
    /// timeout rather than hang.
    async fn execute(
        &self,
        intent: &str,
        params: HashMap<String, String>,
    ) -> Result<BridgeResponse, String>;

    /// Whether the host exposes the given capability. Resolved once at
    /// startup when tools are constructed, never at call time.
    fn supports(&self, intent: &str) -> bool {
        let _ = intent;
        true
    }
}

/// An echo bridge for tests and the CLI demo: every command "succeeds" and
/// reports what it would have done.
pub struct LoopbackBridge {
    capabilities: Vec<String>,
}

impl LoopbackBridge {
    pub fn new() -> Self {
        Self {
            capabilities: ["TOAST", "LAUNCH_APP", "VIBRATE", "QUERY_BATTERY"]
                .map(String::from)
                .to_vec(),
        }
    }

    /// A loopback bridge with a restricted capability set.
    pub fn with_capabilities(capabilities: &[&str]) -> Self {
        Self {
            capabilities: capabilities.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for LoopbackBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceBridge for LoopbackBridge {
    async fn execute(
        &self,
        intent: &str,
        params: HashMap<String, String>,
    ) -> Result<BridgeResponse, String> {
        if !self.supports(intent) {
            return Err(format!("unsupported intent: {intent}"));
        }
        let data = match intent {
            "QUERY_BATTERY" => serde_json::json!({ "level": 85, "charging": false }),
            _ => serde_json::json!({ "echo_params": params }),
        };
        Ok(BridgeResponse {
            success: true,
            message: format!("Executed {intent}"),
            data,
        })
    }

    fn supports(&self, intent: &str) -> bool {
        self.capabilities.iter().any(|c| c == intent)
    }
}
