//! CLI subcommand implementations.

pub mod ask;
pub mod chat;
pub mod intent;
pub mod tools;

use std::sync::Arc;
use std::time::Duration;

use vesper_agent::{Assistant, ContextManager, Orchestrator, OrchestratorConfig};
use vesper_config::AssistantConfig;
use vesper_core::backend::InferenceBackend;
use vesper_core::registry::ToolRegistry;
use vesper_dispatch::{ActionDispatcher, ToolBackedHandler};
use vesper_nlu::IntentClassifier;
use vesper_providers::{FallbackBackend, LocalBackend, RemoteBackend};
use vesper_tools::LoopbackBridge;

/// Per-backend timeout inside the fallback chain.
const BACKEND_TIMEOUT: Duration = Duration::from_secs(60);

/// Build a fully wired assistant from configuration.
///
/// The device bridge here is the loopback echo — the CLI demos the
/// orchestration engine without a real device attached.
pub(crate) fn build_assistant(config: &AssistantConfig) -> Assistant {
    let registry = Arc::new(build_registry());

    let remote: Arc<dyn InferenceBackend> = Arc::new(RemoteBackend::new(
        config.backends.remote.url.as_str(),
        config.backends.remote.api_key.clone().unwrap_or_default(),
        config.backends.remote.model.as_str(),
    ));
    let local: Arc<dyn InferenceBackend> = Arc::new(LocalBackend::new(
        Some(config.backends.local.url.as_str()),
        config.backends.local.model.as_str(),
    ));

    let chain = if config.backends.prefer == "local" {
        FallbackBackend::new("local-first")
            .add(local, BACKEND_TIMEOUT)
            .add(remote, BACKEND_TIMEOUT)
    } else {
        FallbackBackend::new("remote-first")
            .add(remote, BACKEND_TIMEOUT)
            .add(local, BACKEND_TIMEOUT)
    };

    let orch_cfg = &config.orchestrator;
    let orchestrator = Orchestrator::new(Arc::new(chain), registry.clone())
        .with_config(OrchestratorConfig {
            max_iterations: orch_cfg.max_iterations,
            temperature: orch_cfg.temperature,
            max_tokens: orch_cfg.max_tokens,
            observation_limit: orch_cfg.observation_limit_chars,
            prefer_action_over_answer: true,
        })
        .with_context(ContextManager::with_limits(
            orch_cfg.history_max_messages,
            orch_cfg.context_budget_tokens,
        ));

    let mut dispatcher = ActionDispatcher::with_defaults();
    dispatcher.register_handler(Box::new(ToolBackedHandler::new(registry)));

    Assistant::new(IntentClassifier::new(), dispatcher, orchestrator)
        .with_confidence_threshold(orch_cfg.confidence_threshold)
}

pub(crate) fn build_registry() -> ToolRegistry {
    vesper_tools::default_registry(Arc::new(LoopbackBridge::new()))
}
