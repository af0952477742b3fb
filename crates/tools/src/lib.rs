//! Built-in tool implementations for Vesper.
//!
//! Tools give the reasoning loop the ability to act on the host device:
//! show a toast, launch an app, vibrate, read the battery, search the web.
//! Device tools are thin adapters over the `DeviceBridge` port — the host
//! platform implements the bridge, the tools only speak its narrow
//! request/response contract.

pub mod app_launch;
pub mod battery;
pub mod bridge;
pub mod toast;
pub mod vibrate;
pub mod web_search;

use std::sync::Arc;
use vesper_core::registry::ToolRegistry;

pub use bridge::{BridgeResponse, DeviceBridge, LoopbackBridge};

/// Create a default tool registry wired to the given device bridge.
///
/// The haptics capability is probed once here; when the bridge doesn't
/// report it, the vibrate tool is registered without it and fails fast.
pub fn default_registry(bridge: Arc<dyn DeviceBridge>) -> ToolRegistry {
    let registry = ToolRegistry::new();
    let haptics = bridge.supports("VIBRATE").then(|| bridge.clone());
    registry.register(Box::new(toast::ToastTool::new(bridge.clone())));
    registry.register(Box::new(app_launch::AppLaunchTool::new(bridge.clone())));
    registry.register(Box::new(vibrate::VibrateTool::new(haptics)));
    registry.register(Box::new(battery::BatteryTool::new(bridge)));
    registry.register(Box::new(web_search::WebSearchTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_device_tools() {
        let registry = default_registry(Arc::new(LoopbackBridge::new()));
        for name in [
            "show_toast",
            "open_app",
            "vibrate",
            "battery_status",
            "web_search",
        ] {
            assert!(registry.get(name).is_some(), "missing tool {name}");
        }
    }
}
