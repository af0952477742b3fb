//! Action handler contract — the seam between the dispatcher and the host
//! application's feature modules.
//!
//! Handlers are implemented outside the core (calendar, contacts, notes,
//! device skills, …); the dispatcher only depends on this narrow contract.

use crate::error::DispatchError;
use crate::intent::{IntentKind, ParsedIntent};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The result of dispatching an intent to a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// Whether the action completed
    pub success: bool,

    /// User-facing natural-language result
    pub message: String,

    /// Optional structured payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Optional clarifying prompt shown to the user when the intent is
    /// missing required entities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            follow_up: None,
        }
    }

    pub fn ok_with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::ok(message)
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            follow_up: None,
        }
    }

    pub fn fail_with_follow_up(
        message: impl Into<String>,
        follow_up: impl Into<String>,
    ) -> Self {
        Self {
            follow_up: Some(follow_up.into()),
            ..Self::fail(message)
        }
    }

    /// A successful result that signals the caller to hand the request to
    /// the reasoning loop instead of treating it as a terminal response.
    pub fn defer_to_agent() -> Self {
        Self::ok_with_data("", serde_json::json!({ "pass_to_ai": true }))
    }

    /// Whether this result defers the request to the reasoning loop.
    pub fn defers_to_agent(&self) -> bool {
        self.success
            && self
                .data
                .as_ref()
                .and_then(|d| d.get("pass_to_ai"))
                .and_then(|v| v.as_bool())
                .unwrap_or(false)
    }
}

/// The action handler contract.
///
/// `can_execute` is the precondition check — it must be cheap and
/// side-effect free. `execute` may fail; the dispatcher converts any error
/// into a failure `ActionResult` and never propagates it.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// The intent kind this handler serves.
    fn kind(&self) -> IntentKind;

    /// Whether the intent carries everything the handler needs.
    fn can_execute(&self, intent: &ParsedIntent) -> bool;

    /// Perform the action.
    async fn execute(
        &self,
        intent: &ParsedIntent,
    ) -> std::result::Result<ActionResult, DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defer_to_agent_is_detectable() {
        let result = ActionResult::defer_to_agent();
        assert!(result.success);
        assert!(result.defers_to_agent());
    }

    #[test]
    fn plain_success_does_not_defer() {
        let result = ActionResult::ok("Reminder set.");
        assert!(!result.defers_to_agent());
    }

    #[test]
    fn follow_up_round_trips() {
        let result =
            ActionResult::fail_with_follow_up("Missing contact", "Who should I call?");
        let json = serde_json::to_string(&result).unwrap();
        let back: ActionResult = serde_json::from_str(&json).unwrap();
        assert!(!back.success);
        assert_eq!(back.follow_up.as_deref(), Some("Who should I call?"));
    }
}
