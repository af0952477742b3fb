//! The assistant facade — classify, dispatch, or reason.
//!
//! An incoming utterance first goes through the intent classifier. When
//! classification confidence clears the threshold and the dispatcher can
//! satisfy the intent's preconditions, the matching handler runs directly
//! and the model is bypassed entirely. Everything else — low confidence, a
//! declining handler, or a handler that defers — lands in the reasoning
//! loop.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use vesper_core::event::{DomainEvent, EventBus};
use vesper_core::intent::ParsedIntent;
use vesper_dispatch::ActionDispatcher;
use vesper_nlu::IntentClassifier;

use crate::events::RunEvent;
use crate::orchestrator::{OrchestrationResult, Orchestrator};

/// Default confidence gate for the dispatch short-circuit.
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.55;

/// Which path produced the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyVia {
    /// A handler satisfied the intent directly.
    Dispatch,
    /// The reasoning loop produced the answer.
    Agent,
}

/// The assistant's reply to one utterance.
#[derive(Debug, Clone)]
pub struct AssistantReply {
    pub text: String,
    pub via: ReplyVia,
    pub intent: ParsedIntent,
    /// Present when the reasoning loop ran.
    pub orchestration: Option<OrchestrationResult>,
}

/// Owns the classify → dispatch → reason pipeline for one conversation.
pub struct Assistant {
    classifier: IntentClassifier,
    dispatcher: ActionDispatcher,
    orchestrator: Orchestrator,
    confidence_threshold: f32,
    event_bus: Arc<EventBus>,
}

impl Assistant {
    pub fn new(
        classifier: IntentClassifier,
        dispatcher: ActionDispatcher,
        orchestrator: Orchestrator,
    ) -> Self {
        Self {
            classifier,
            dispatcher,
            orchestrator,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Process one utterance end-to-end.
    pub async fn handle(&mut self, utterance: &str) -> AssistantReply {
        self.handle_with_events(utterance, None).await
    }

    /// Process one utterance, streaming reasoning-loop events when the
    /// request falls through to the model.
    pub async fn handle_with_events(
        &mut self,
        utterance: &str,
        events: Option<mpsc::Sender<RunEvent>>,
    ) -> AssistantReply {
        let intent = self.classifier.parse(utterance);
        info!(kind = %intent.kind, confidence = intent.confidence, "Utterance classified");
        self.event_bus.publish(DomainEvent::IntentClassified {
            kind: intent.kind.to_string(),
            confidence: intent.confidence,
            timestamp: Utc::now(),
        });

        if intent.confidence > self.confidence_threshold && self.dispatcher.can_execute(&intent)
        {
            let result = self.dispatcher.execute(&intent).await;
            self.event_bus.publish(DomainEvent::ActionDispatched {
                kind: intent.kind.to_string(),
                success: result.success,
                timestamp: Utc::now(),
            });

            if !result.defers_to_agent() {
                let text = result
                    .follow_up
                    .clone()
                    .unwrap_or_else(|| result.message.clone());
                self.orchestrator.record_exchange(utterance, &text);
                return AssistantReply {
                    text,
                    via: ReplyVia::Dispatch,
                    intent,
                    orchestration: None,
                };
            }
            debug!(kind = %intent.kind, "Handler deferred to the reasoning loop");
        }

        let orchestration = self.orchestrator.run(utterance, None, events).await;
        AssistantReply {
            text: orchestration.final_answer.clone(),
            via: ReplyVia::Agent,
            intent,
            orchestration: Some(orchestration),
        }
    }

    /// Registry/dispatcher access for host wiring.
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn dispatcher_mut(&mut self) -> &mut ActionDispatcher {
        &mut self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use vesper_core::action::{ActionHandler, ActionResult};
    use vesper_core::backend::{ChatReply, ChatRequest, InferenceBackend};
    use vesper_core::error::{BackendError, DispatchError};
    use vesper_core::intent::IntentKind;
    use vesper_core::registry::ToolRegistry;

    /// Counts model calls; always answers.
    struct CountingBackend {
        calls: Mutex<usize>,
    }

    impl CountingBackend {
        fn new() -> Self {
            Self {
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl InferenceBackend for CountingBackend {
        fn name(&self) -> &str {
            "counting"
        }
        async fn chat(&self, _request: ChatRequest) -> Result<ChatReply, BackendError> {
            *self.calls.lock().unwrap() += 1;
            Ok(ChatReply {
                text: "ANSWER: The model answered.".into(),
                tokens_used: 15,
                model: "mock-model".into(),
            })
        }
    }

    struct ReminderHandler;

    #[async_trait]
    impl ActionHandler for ReminderHandler {
        fn kind(&self) -> IntentKind {
            IntentKind::Reminder
        }
        fn can_execute(&self, intent: &ParsedIntent) -> bool {
            intent.entities.subject.is_some()
        }
        async fn execute(
            &self,
            intent: &ParsedIntent,
        ) -> Result<ActionResult, DispatchError> {
            Ok(ActionResult::ok(format!(
                "Reminder set: {}",
                intent.entities.subject.as_deref().unwrap_or("(something)")
            )))
        }
    }

    fn assistant_with(backend: Arc<CountingBackend>) -> Assistant {
        let registry = Arc::new(ToolRegistry::new());
        let orchestrator = Orchestrator::new(backend, registry);
        let mut dispatcher = ActionDispatcher::with_defaults();
        dispatcher.register_handler(Box::new(ReminderHandler));
        Assistant::new(IntentClassifier::new(), dispatcher, orchestrator)
    }

    #[tokio::test]
    async fn high_confidence_intent_bypasses_model() {
        let backend = Arc::new(CountingBackend::new());
        let mut assistant = assistant_with(backend.clone());

        let reply = assistant.handle("remind me to stretch").await;

        assert_eq!(reply.via, ReplyVia::Dispatch);
        assert_eq!(reply.text, "Reminder set: stretch");
        assert_eq!(reply.intent.kind, IntentKind::Reminder);
        assert!(reply.orchestration.is_none());
        assert_eq!(*backend.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_utterance_goes_to_model() {
        let backend = Arc::new(CountingBackend::new());
        let mut assistant = assistant_with(backend.clone());

        let reply = assistant.handle("qwertyuiop zxcvbnm").await;

        assert_eq!(reply.via, ReplyVia::Agent);
        assert_eq!(reply.text, "The model answered.");
        assert!(reply.orchestration.is_some());
        assert_eq!(*backend.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn search_intent_defers_to_model() {
        let backend = Arc::new(CountingBackend::new());
        let mut assistant = assistant_with(backend.clone());

        let reply = assistant.handle("what is the speed of light").await;

        // The reserved search handler succeeds with pass_to_ai, so the
        // request falls through to the reasoning loop.
        assert_eq!(reply.via, ReplyVia::Agent);
        assert_eq!(*backend.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn entityless_utterance_falls_through_to_model() {
        let backend = Arc::new(CountingBackend::new());
        let mut assistant = assistant_with(backend.clone());

        // No extractable subject: the dispatch gate doesn't open, the loop runs.
        let reply = assistant.handle("remind me").await;

        assert_eq!(reply.via, ReplyVia::Agent);
        assert_eq!(*backend.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn dispatch_exchange_lands_in_history() {
        let backend = Arc::new(CountingBackend::new());
        let mut assistant = assistant_with(backend);

        let _ = assistant.handle("remind me to stretch").await;

        let history = assistant.orchestrator().history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "remind me to stretch");
        assert_eq!(history[1].content, "Reminder set: stretch");
    }
}
