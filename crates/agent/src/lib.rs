//! The Vesper reasoning loop — the heart of the orchestration engine.
//!
//! The loop follows a **Think → Act → Observe** cycle:
//!
//! 1. **Build prompt** — instruction template + healthy tools + pruned
//!    history + this run's working scratch
//! 2. **Call model** via the configured inference backend
//! 3. **Parse response** — `THOUGHT:` then exactly one of `ACTION:` or
//!    `ANSWER:`; actions win over trailing answers
//! 4. **If action**: execute the tool through the registry, append the
//!    observation, loop back to step 1
//! 5. **If answer**: persist it and return
//!
//! The cycle is bounded by `max_iterations`; exceeding the bound produces a
//! graceful fallback that names the tools that failed along the way.
//!
//! The `Assistant` facade layers the short-circuit in front: classify the
//! utterance, dispatch it directly when a handler can satisfy it, and only
//! fall through to the model for everything else.

pub mod assistant;
pub mod context;
pub mod events;
pub mod orchestrator;
pub mod parser;
pub mod prompt;

pub use assistant::{Assistant, AssistantReply, ReplyVia};
pub use context::{ContextManager, WorkingContext, estimate_tokens};
pub use events::RunEvent;
pub use orchestrator::{Orchestrator, OrchestratorConfig, OrchestrationResult};
pub use parser::{ParsedAction, ParsedResponse, ResponseParser};
