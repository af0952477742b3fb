//! # Vesper Core
//!
//! Domain types, traits, and error definitions for the Vesper assistant
//! orchestration engine. This crate has **zero framework dependencies** —
//! it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)
//!
//! The registry, classifier, dispatcher, and orchestrator are all explicit
//! owned instances constructed with their dependencies injected — never
//! process-wide singletons — so independent conversations and tests can run
//! without shared global state.

pub mod action;
pub mod backend;
pub mod clock;
pub mod error;
pub mod event;
pub mod intent;
pub mod message;
pub mod registry;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use action::{ActionHandler, ActionResult};
pub use backend::{ChatReply, ChatRequest, InferenceBackend, TokenChunk};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{BackendError, DispatchError, Error, Result, ToolError};
pub use event::{DomainEvent, EventBus};
pub use intent::{Entities, IntentKind, ParsedIntent};
pub use message::{ChatMessage, Conversation, ConversationId, Role};
pub use registry::{ToolRegistry, ToolStatus};
pub use tool::{Tool, ToolCall, ToolDescriptor, ToolOutput, ToolSource};
