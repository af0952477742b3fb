//! Built-in action handlers.
//!
//! `PassToAgentHandler` implements the reserved `unknown`/`search` behavior:
//! it always succeeds with `data.pass_to_ai = true`, signaling the caller to
//! hand the request to the reasoning loop.
//!
//! `ToolBackedHandler` bridges device-skill micro-commands straight onto
//! registry tools through the dispatcher's direct path, so an exhausted tool
//! stays reachable for explicit user commands even while it is hidden from
//! the model's prompt.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use vesper_core::action::{ActionHandler, ActionResult};
use vesper_core::error::DispatchError;
use vesper_core::intent::{IntentKind, ParsedIntent};
use vesper_core::registry::ToolRegistry;
use vesper_core::tool::ToolCall;

/// Always succeeds with a deferral marker.
pub struct PassToAgentHandler {
    kind: IntentKind,
}

impl PassToAgentHandler {
    pub fn new(kind: IntentKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl ActionHandler for PassToAgentHandler {
    fn kind(&self) -> IntentKind {
        self.kind
    }

    fn can_execute(&self, _intent: &ParsedIntent) -> bool {
        true
    }

    async fn execute(
        &self,
        _intent: &ParsedIntent,
    ) -> Result<ActionResult, DispatchError> {
        Ok(ActionResult::defer_to_agent())
    }
}

/// Executes device-skill intents against registry tools directly.
pub struct ToolBackedHandler {
    registry: Arc<ToolRegistry>,
}

impl ToolBackedHandler {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Map the intent's positional `skill_args` onto the tool's declared
    /// parameters: `required` order first, then the remaining properties
    /// sorted by name. Numeric-looking args become JSON numbers.
    fn build_arguments(
        &self,
        tool_name: &str,
        args: &[String],
    ) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        let Some(tool) = self.registry.get(tool_name) else {
            return serde_json::Value::Object(object);
        };
        let schema = tool.parameters_schema();
        let required: Vec<String> = schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let mut param_order = required;
        if let Some(props) = schema.get("properties").and_then(|p| p.as_object()) {
            let mut optional: Vec<String> = props
                .keys()
                .filter(|k| !param_order.contains(k))
                .cloned()
                .collect();
            optional.sort();
            param_order.extend(optional);
        }

        for (param, arg) in param_order.iter().zip(args.iter()) {
            let value = arg
                .parse::<i64>()
                .map(serde_json::Value::from)
                .unwrap_or_else(|_| serde_json::Value::from(arg.clone()));
            object.insert(param.clone(), value);
        }
        // A single-parameter tool gets the whole arg list joined, so
        // "show a toast saying hello there" passes the full message.
        if param_order.len() == 1 && args.len() > 1 {
            object.insert(
                param_order[0].clone(),
                serde_json::Value::from(args.join(" ")),
            );
        }
        serde_json::Value::Object(object)
    }
}

#[async_trait]
impl ActionHandler for ToolBackedHandler {
    fn kind(&self) -> IntentKind {
        IntentKind::DeviceSkill
    }

    fn can_execute(&self, intent: &ParsedIntent) -> bool {
        intent
            .entities
            .skill_id
            .as_deref()
            .is_some_and(|id| self.registry.get(id).is_some())
    }

    async fn execute(
        &self,
        intent: &ParsedIntent,
    ) -> Result<ActionResult, DispatchError> {
        let skill_id = intent
            .entities
            .skill_id
            .as_deref()
            .ok_or_else(|| DispatchError::MissingEntities {
                prompt: "Which skill should I run?".into(),
            })?;

        let arguments = self.build_arguments(skill_id, &intent.entities.skill_args);
        debug!(skill = skill_id, %arguments, "Executing device skill");

        let call = ToolCall::new(skill_id, arguments);
        let output = self.registry.execute_direct(&call).await;

        if output.success {
            Ok(ActionResult::ok_with_data(
                output.output,
                output.data.unwrap_or(serde_json::Value::Null),
            ))
        } else {
            Ok(ActionResult::fail(output.output))
        }
    }
}
