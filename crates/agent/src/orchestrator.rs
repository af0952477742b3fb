//! The reasoning loop implementation.
//!
//! One run is strictly sequential: at most one model call and one tool
//! execution in flight, iterations never overlap. The state machine is
//! `BuildPrompt → CallModel → ParseResponse → {ExecuteTool → BuildPrompt |
//! FinalAnswer | RawCleaned}`, bounded by `max_iterations`. Every failure
//! is normalized into the run result — nothing escapes this module as an
//! error.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use vesper_core::backend::{ChatRequest, InferenceBackend};
use vesper_core::event::{DomainEvent, EventBus};
use vesper_core::message::ChatMessage;
use vesper_core::registry::ToolRegistry;
use vesper_core::tool::ToolCall;

use crate::context::{ContextManager, WorkingContext, estimate_tokens};
use crate::events::RunEvent;
use crate::parser::{ResponseParser, resolve_tool_name, sanitize_raw};
use crate::prompt::build_system_prompt;

/// Tuning knobs for the reasoning loop.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Iteration cap per run.
    pub max_iterations: u32,
    /// Sampling temperature for model calls.
    pub temperature: f32,
    /// Per-response completion cap.
    pub max_tokens: Option<u32>,
    /// Character budget for OBSERVATION scratch turns.
    pub observation_limit: usize,
    /// Discard a trailing ANSWER when an ACTION is present.
    pub prefer_action_over_answer: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            temperature: 0.7,
            max_tokens: None,
            observation_limit: 500,
            prefer_action_over_answer: true,
        }
    }
}

/// The terminal record of one reasoning-loop run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationResult {
    /// The model's last recorded thought.
    pub thought: Option<String>,
    /// The last tool action executed, if any.
    pub action: Option<String>,
    /// The user-facing answer (always present; fallback text on failure).
    pub final_answer: String,
    /// Accumulated token estimate across all model calls in the run.
    pub tokens_used: u32,
    /// Iterations actually executed.
    pub iterations: u32,
    /// Tools that failed during this run, deduplicated.
    pub failed_tools: Vec<String>,
}

/// The think → act → observe controller.
pub struct Orchestrator {
    backend: Arc<dyn InferenceBackend>,
    registry: Arc<ToolRegistry>,
    context: ContextManager,
    parser: ResponseParser,
    config: OrchestratorConfig,
    event_bus: Arc<EventBus>,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn InferenceBackend>, registry: Arc<ToolRegistry>) -> Self {
        let config = OrchestratorConfig::default();
        Self {
            backend,
            registry,
            context: ContextManager::new(),
            parser: ResponseParser::new()
                .with_action_preference(config.prefer_action_over_answer),
            config,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.parser =
            ResponseParser::new().with_action_preference(config.prefer_action_over_answer);
        self.config = config;
        self
    }

    pub fn with_context(mut self, context: ContextManager) -> Self {
        self.context = context;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// The persisted conversation history (for inspection/tests).
    pub fn history(&self) -> &[ChatMessage] {
        self.context.history()
    }

    /// Persist a user/assistant exchange that was satisfied without the
    /// model (the dispatcher's direct path), so later runs see it.
    pub fn record_exchange(&mut self, user: &str, assistant: &str) {
        self.context.append(ChatMessage::user(user));
        self.context.append(ChatMessage::assistant(assistant));
    }

    /// Execute one reasoning run.
    ///
    /// `prompt_prefix` is prepended to the system prompt; `events`, when
    /// provided, receives thoughts, actions, observations, raw tokens, and
    /// the terminal event.
    pub async fn run(
        &mut self,
        user_message: &str,
        prompt_prefix: Option<&str>,
        events: Option<mpsc::Sender<RunEvent>>,
    ) -> OrchestrationResult {
        info!(max_iterations = self.config.max_iterations, "Reasoning run starting");

        self.context.append(ChatMessage::user(user_message));

        let mut working = WorkingContext::new(self.config.max_iterations);
        let mut tokens_used: u32 = 0;
        let mut failed_tools: Vec<String> = Vec::new();
        let mut last_thought: Option<String> = None;

        loop {
            if !working.tick() {
                warn!(
                    iterations = self.config.max_iterations,
                    "Max iterations reached"
                );
                break;
            }

            // ── Build prompt ──
            let tools = self.registry.prompt_tools();
            let system_prompt = build_system_prompt(&tools, prompt_prefix);
            let system_tokens = estimate_tokens(&system_prompt);
            let mut messages = self.context.prune(system_tokens).to_vec();
            messages.extend(working.messages());

            let request = ChatRequest {
                system_prompt,
                messages,
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
            };

            // ── Call model ──
            let reply = match self.call_model(request, &events).await {
                Ok(reply) => reply,
                Err(message) => {
                    warn!(error = %message, "Model unavailable");
                    self.event_bus.publish(DomainEvent::ErrorOccurred {
                        context: "orchestrator".into(),
                        error_message: message,
                        timestamp: Utc::now(),
                    });
                    let answer =
                        "I couldn't reach my reasoning model just now. Please try again in a moment."
                            .to_string();
                    return self
                        .finish(answer, last_thought, tokens_used, &working, failed_tools, &events)
                        .await;
                }
            };

            tokens_used += reply.tokens_used;
            self.event_bus.publish(DomainEvent::ResponseGenerated {
                model: reply.model.clone(),
                tokens_used: reply.tokens_used,
                timestamp: Utc::now(),
            });

            // ── Parse response ──
            let parsed = self.parser.parse(&reply.text);

            if let Some(thought) = &parsed.thought {
                working.add_thought(thought);
                emit(&events, RunEvent::Thought {
                    content: thought.clone(),
                })
                .await;
                last_thought = Some(thought.clone());
            }

            if let Some(action) = parsed.action {
                // ── Execute tool ──
                self.execute_action(
                    &action.tool_name,
                    action.params,
                    &mut working,
                    &mut failed_tools,
                    &events,
                )
                .await;
                continue;
            }

            if let Some(answer) = parsed.answer {
                return self
                    .finish(answer, last_thought, tokens_used, &working, failed_tools, &events)
                    .await;
            }

            // No protocol at all: sanitize the raw text and use it as a
            // best-effort final answer rather than discarding it.
            let cleaned = sanitize_raw(&reply.text);
            if !cleaned.is_empty() {
                debug!("Model skipped the protocol; using sanitized raw text");
                return self
                    .finish(cleaned, last_thought, tokens_used, &working, failed_tools, &events)
                    .await;
            }
            // Empty response: let the loop try again within its budget.
        }

        // ── Iteration budget exhausted ──
        let mut unavailable = self.registry.exhausted_tools();
        if unavailable.is_empty() {
            unavailable = failed_tools.clone();
        }
        let answer = if unavailable.is_empty() {
            "I couldn't complete that in time. Try a simpler request.".to_string()
        } else {
            format!(
                "I couldn't complete that in time ({} unavailable). Try a simpler request.",
                unavailable.join(", ")
            )
        };
        self.finish(answer, last_thought, tokens_used, &working, failed_tools, &events)
            .await
    }

    /// Resolve and execute one tool action, recording the ACTION and
    /// OBSERVATION scratch turns.
    async fn execute_action(
        &self,
        requested: &str,
        params: serde_json::Value,
        working: &mut WorkingContext,
        failed_tools: &mut Vec<String>,
        events: &Option<mpsc::Sender<RunEvent>>,
    ) {
        let known = self.registry.tool_names();
        let Some(tool_name) = resolve_tool_name(requested, &known) else {
            warn!(tool = requested, "Tool not found (no fuzzy match)");
            working.add_observation(&format!(
                "Unknown tool '{requested}'. Use one of the tools listed above."
            ));
            return;
        };

        if tool_name != requested {
            debug!(requested, resolved = %tool_name, "Fuzzy-matched tool name");
        }

        working.add_action(&format!("{tool_name} {params}"));
        emit(events, RunEvent::Action {
            tool_name: tool_name.clone(),
            params: params.clone(),
        })
        .await;

        let call = ToolCall::new(tool_name.clone(), params);
        let start = Instant::now();
        let output = self.registry.execute(&call).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        self.event_bus.publish(DomainEvent::ToolExecuted {
            tool_name: tool_name.clone(),
            success: output.success,
            duration_ms,
            timestamp: Utc::now(),
        });

        if !output.success && !failed_tools.contains(&tool_name) {
            failed_tools.push(tool_name.clone());
        }

        // Prefer the tool's formatted output; fall back to a JSON snippet.
        let mut observation = if !output.output.is_empty() {
            output.output.clone()
        } else {
            output
                .data
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "(no output)".to_string())
        };
        observation = truncate_chars(&observation, self.config.observation_limit);
        working.add_observation(&observation);

        emit(events, RunEvent::Observation {
            content: observation,
            success: output.success,
        })
        .await;
    }

    /// Call the model, streaming tokens to the event channel when one is
    /// attached. A backend error becomes a plain message for the caller.
    async fn call_model(
        &self,
        request: ChatRequest,
        events: &Option<mpsc::Sender<RunEvent>>,
    ) -> Result<vesper_core::backend::ChatReply, String> {
        let Some(tx) = events else {
            return self.backend.chat(request).await.map_err(|e| e.to_string());
        };

        let mut rx = self
            .backend
            .chat_stream(request)
            .await
            .map_err(|e| e.to_string())?;

        let mut text = String::new();
        let mut tokens_used = None;
        while let Some(chunk) = rx.recv().await {
            let chunk = chunk.map_err(|e| e.to_string())?;
            if let Some(content) = chunk.content {
                if !content.is_empty() {
                    text.push_str(&content);
                    let _ = tx.send(RunEvent::Token { content }).await;
                }
            }
            if let Some(tokens) = chunk.tokens_used {
                tokens_used = Some(tokens);
            }
            if chunk.done {
                break;
            }
        }

        if text.is_empty() {
            return Err("empty streamed response".into());
        }

        let tokens_used = tokens_used.unwrap_or_else(|| estimate_tokens(&text) as u32);
        Ok(vesper_core::backend::ChatReply {
            text,
            tokens_used,
            model: self.backend.name().to_string(),
        })
    }

    /// Persist the final answer and assemble the run result.
    async fn finish(
        &mut self,
        final_answer: String,
        thought: Option<String>,
        tokens_used: u32,
        working: &WorkingContext,
        failed_tools: Vec<String>,
        events: &Option<mpsc::Sender<RunEvent>>,
    ) -> OrchestrationResult {
        self.context.append(ChatMessage::assistant(&final_answer));

        let iterations = working.iterations();
        self.event_bus.publish(DomainEvent::RunCompleted {
            iterations,
            tokens_used,
            timestamp: Utc::now(),
        });
        emit(events, RunEvent::Done {
            final_answer: final_answer.clone(),
            iterations,
            tokens_used,
        })
        .await;

        info!(iterations, tokens_used, "Reasoning run completed");

        let action = working
            .turns()
            .iter()
            .rev()
            .find(|t| t.kind == crate::context::ScratchKind::Action)
            .map(|t| t.content.clone());

        OrchestrationResult {
            thought,
            action,
            final_answer,
            tokens_used,
            iterations,
            failed_tools,
        }
    }
}

async fn emit(events: &Option<mpsc::Sender<RunEvent>>, event: RunEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}

/// Truncate to a character budget without splitting a UTF-8 boundary.
fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit).collect();
    out.push('…');
    out
}
