//! The action dispatcher.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use vesper_core::action::{ActionHandler, ActionResult};
use vesper_core::intent::{IntentKind, ParsedIntent};

use crate::handlers::PassToAgentHandler;

/// Maps a classified intent to a registered handler, enforcing
/// preconditions and producing user-facing results.
pub struct ActionDispatcher {
    handlers: HashMap<IntentKind, Arc<dyn ActionHandler>>,
}

impl ActionDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Create a dispatcher with the reserved `unknown` and `search`
    /// handlers pre-registered (both defer to the reasoning loop).
    pub fn with_defaults() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register_handler(Box::new(PassToAgentHandler::new(IntentKind::Unknown)));
        dispatcher.register_handler(Box::new(PassToAgentHandler::new(IntentKind::Search)));
        dispatcher
    }

    /// Register a handler. Replaces any existing handler for the same kind.
    pub fn register_handler(&mut self, handler: Box<dyn ActionHandler>) {
        self.handlers.insert(handler.kind(), handler.into());
    }

    /// Whether a handler exists for the intent and its preconditions hold.
    pub fn can_execute(&self, intent: &ParsedIntent) -> bool {
        self.handlers
            .get(&intent.kind)
            .is_some_and(|h| h.can_execute(intent))
    }

    /// Dispatch an intent. Always returns a result value — handler errors
    /// are caught and converted into failure results.
    pub async fn execute(&self, intent: &ParsedIntent) -> ActionResult {
        let Some(handler) = self.handlers.get(&intent.kind) else {
            warn!(kind = %intent.kind, "No handler registered for intent");
            return ActionResult::fail(format!(
                "I don't know how to handle '{}' requests.",
                intent.kind
            ));
        };

        if !handler.can_execute(intent) {
            debug!(kind = %intent.kind, "Handler precondition failed");
            return ActionResult::fail_with_follow_up(
                format!("I need more details for that {}.", intent.kind),
                missing_entity_prompt(intent.kind),
            );
        }

        match handler.execute(intent).await {
            Ok(result) => result,
            Err(e) => {
                warn!(kind = %intent.kind, error = %e, "Handler failed");
                ActionResult::fail(format!("Sorry, I couldn't do that: {e}"))
            }
        }
    }
}

impl Default for ActionDispatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// The kind-specific "what's missing" prompt shown when a handler's
/// preconditions are not met.
pub fn missing_entity_prompt(kind: IntentKind) -> &'static str {
    match kind {
        IntentKind::Reminder => "What should I remind you about?",
        IntentKind::Message => "Who should I message, and what should it say?",
        IntentKind::Note => "What should the note say?",
        IntentKind::CalendarEvent => "What should I put on your calendar?",
        IntentKind::Timer => "For how long?",
        IntentKind::AppLaunch => "Which app should I open?",
        IntentKind::Call => "Who should I call?",
        IntentKind::Navigation => "Where would you like to go?",
        IntentKind::Search => "What should I search for?",
        IntentKind::DeviceSkill => "Which skill should I run?",
        IntentKind::SettingsToggle => "Which setting should I change?",
        IntentKind::Unknown => "Could you rephrase that?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use vesper_core::error::DispatchError;
    use vesper_core::intent::Entities;

    /// A call handler that requires a contact entity.
    struct CallHandler {
        executions: AtomicU32,
    }

    impl CallHandler {
        fn new() -> Self {
            Self {
                executions: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ActionHandler for CallHandler {
        fn kind(&self) -> IntentKind {
            IntentKind::Call
        }

        fn can_execute(&self, intent: &ParsedIntent) -> bool {
            intent.entities.contact.is_some()
        }

        async fn execute(
            &self,
            intent: &ParsedIntent,
        ) -> Result<ActionResult, DispatchError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            Ok(ActionResult::ok(format!(
                "Calling {}…",
                intent.entities.contact.as_deref().unwrap_or("someone")
            )))
        }
    }

    /// A handler that always errors.
    struct ExplodingHandler;

    #[async_trait]
    impl ActionHandler for ExplodingHandler {
        fn kind(&self) -> IntentKind {
            IntentKind::Timer
        }
        fn can_execute(&self, _intent: &ParsedIntent) -> bool {
            true
        }
        async fn execute(
            &self,
            _intent: &ParsedIntent,
        ) -> Result<ActionResult, DispatchError> {
            Err(DispatchError::HandlerFailed {
                kind: "timer".into(),
                reason: "alarm service unreachable".into(),
            })
        }
    }

    fn intent(kind: IntentKind, entities: Entities) -> ParsedIntent {
        ParsedIntent {
            kind,
            confidence: 0.9,
            raw: "test".into(),
            entities,
        }
    }

    #[tokio::test]
    async fn dispatches_to_matching_handler() {
        let mut dispatcher = ActionDispatcher::new();
        dispatcher.register_handler(Box::new(CallHandler::new()));

        let result = dispatcher
            .execute(&intent(
                IntentKind::Call,
                Entities {
                    contact: Some("mom".into()),
                    ..Entities::default()
                },
            ))
            .await;

        assert!(result.success);
        assert_eq!(result.message, "Calling mom…");
    }

    #[tokio::test]
    async fn unknown_kind_returns_failure_naming_it() {
        let dispatcher = ActionDispatcher::new();
        let result = dispatcher
            .execute(&intent(IntentKind::Navigation, Entities::default()))
            .await;
        assert!(!result.success);
        assert!(result.message.contains("navigation"));
    }

    #[tokio::test]
    async fn missing_precondition_returns_follow_up_without_executing() {
        let mut dispatcher = ActionDispatcher::new();
        let handler = Box::new(CallHandler::new());
        dispatcher.register_handler(handler);

        let result = dispatcher
            .execute(&intent(IntentKind::Call, Entities::default()))
            .await;

        assert!(!result.success);
        assert_eq!(result.follow_up.as_deref(), Some("Who should I call?"));
    }

    #[tokio::test]
    async fn handler_error_is_caught_and_normalized() {
        let mut dispatcher = ActionDispatcher::new();
        dispatcher.register_handler(Box::new(ExplodingHandler));

        let result = dispatcher
            .execute(&intent(IntentKind::Timer, Entities::default()))
            .await;

        assert!(!result.success);
        assert!(result.message.contains("alarm service unreachable"));
    }

    #[tokio::test]
    async fn reserved_handlers_defer_to_agent() {
        let dispatcher = ActionDispatcher::with_defaults();

        let result = dispatcher
            .execute(&ParsedIntent::unknown("do something clever"))
            .await;
        assert!(result.success);
        assert!(result.defers_to_agent());

        let result = dispatcher
            .execute(&intent(
                IntentKind::Search,
                Entities {
                    query: Some("rust borrow checker".into()),
                    ..Entities::default()
                },
            ))
            .await;
        assert!(result.defers_to_agent());
    }

    #[tokio::test]
    async fn can_execute_checks_handler_and_precondition() {
        let mut dispatcher = ActionDispatcher::new();
        dispatcher.register_handler(Box::new(CallHandler::new()));

        assert!(dispatcher.can_execute(&intent(
            IntentKind::Call,
            Entities {
                contact: Some("sam".into()),
                ..Entities::default()
            }
        )));
        assert!(!dispatcher.can_execute(&intent(IntentKind::Call, Entities::default())));
        assert!(!dispatcher.can_execute(&intent(IntentKind::Note, Entities::default())));
    }

    #[tokio::test]
    async fn register_replaces_existing_handler() {
        let mut dispatcher = ActionDispatcher::new();
        dispatcher.register_handler(Box::new(ExplodingHandler));

        struct QuietTimer;
        #[async_trait]
        impl ActionHandler for QuietTimer {
            fn kind(&self) -> IntentKind {
                IntentKind::Timer
            }
            fn can_execute(&self, _intent: &ParsedIntent) -> bool {
                true
            }
            async fn execute(
                &self,
                _intent: &ParsedIntent,
            ) -> Result<ActionResult, DispatchError> {
                Ok(ActionResult::ok("Timer set."))
            }
        }

        dispatcher.register_handler(Box::new(QuietTimer));
        let result = dispatcher
            .execute(&intent(IntentKind::Timer, Entities::default()))
            .await;
        assert!(result.success);
        assert_eq!(result.message, "Timer set.");
    }
}
