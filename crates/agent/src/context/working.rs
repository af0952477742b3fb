//! Working context — the per-run scratchpad.
//!
//! Holds the reasoning trace of a single orchestration run: THOUGHT and
//! ACTION turns from the model, OBSERVATION turns from tool results, plus
//! the iteration counter. Rendered back to the model as alternating
//! scratch messages on each iteration; never written to persisted history.

use serde::{Deserialize, Serialize};
use vesper_core::message::ChatMessage;

/// The kind of scratch turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScratchKind {
    Thought,
    Action,
    Observation,
}

/// A single entry in the run's reasoning trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScratchTurn {
    pub kind: ScratchKind,
    pub content: String,
}

/// The scratchpad for one orchestration run.
#[derive(Debug, Clone)]
pub struct WorkingContext {
    turns: Vec<ScratchTurn>,
    iterations: u32,
    max_iterations: u32,
}

impl WorkingContext {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            turns: Vec::new(),
            iterations: 0,
            max_iterations,
        }
    }

    /// Increment the iteration counter. Returns `false` once the bound is
    /// exceeded.
    pub fn tick(&mut self) -> bool {
        self.iterations += 1;
        self.iterations <= self.max_iterations
    }

    pub fn iterations(&self) -> u32 {
        self.iterations.min(self.max_iterations)
    }

    pub fn add_thought(&mut self, content: &str) {
        self.push(ScratchKind::Thought, content);
    }

    pub fn add_action(&mut self, content: &str) {
        self.push(ScratchKind::Action, content);
    }

    pub fn add_observation(&mut self, content: &str) {
        self.push(ScratchKind::Observation, content);
    }

    fn push(&mut self, kind: ScratchKind, content: &str) {
        self.turns.push(ScratchTurn {
            kind,
            content: content.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[ScratchTurn] {
        &self.turns
    }

    /// Render scratch turns as chat messages for the next model call:
    /// thoughts/actions as assistant turns, observations as user turns.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.turns
            .iter()
            .map(|turn| match turn.kind {
                ScratchKind::Thought => {
                    ChatMessage::assistant(format!("THOUGHT: {}", turn.content))
                }
                ScratchKind::Action => {
                    ChatMessage::assistant(format!("ACTION: {}", turn.content))
                }
                ScratchKind::Observation => {
                    ChatMessage::user(format!("OBSERVATION: {}", turn.content))
                }
            })
            .collect()
    }
}
