//! Conversation context management.
//!
//! `ContextManager` owns the persisted turn history and its pruning policy:
//! a hard cap on message count, then front-trimming until the estimated
//! token cost (history + system prompt) fits the configured budget.
//!
//! `WorkingContext` is the per-run scratchpad: the THOUGHT/ACTION turns the
//! model emitted and the OBSERVATION turns the tools produced. It is
//! visible to the model during the run and discarded when the run ends —
//! only the user's original message and the final answer are persisted.

pub mod token;
pub mod working;

pub use token::{estimate_message_tokens, estimate_messages_tokens, estimate_tokens};
pub use working::{ScratchKind, ScratchTurn, WorkingContext};

use vesper_core::message::ChatMessage;

/// Default hard cap on persisted messages.
const DEFAULT_MAX_MESSAGES: usize = 10;
/// Default token budget: headroom under a 2048-token model window.
const DEFAULT_TOKEN_BUDGET: usize = 1800;

/// Bounded conversation history with token-budget enforcement.
#[derive(Debug, Clone)]
pub struct ContextManager {
    history: Vec<ChatMessage>,
    max_messages: usize,
    token_budget: usize,
}

impl ContextManager {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_MESSAGES, DEFAULT_TOKEN_BUDGET)
    }

    pub fn with_limits(max_messages: usize, token_budget: usize) -> Self {
        Self {
            history: Vec::new(),
            max_messages,
            token_budget,
        }
    }

    /// Append a message to the persisted history.
    pub fn append(&mut self, message: ChatMessage) {
        self.history.push(message);
    }

    /// The full unpruned history.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn token_budget(&self) -> usize {
        self.token_budget
    }

    /// Estimate the token cost of a piece of text (~4 chars per token).
    pub fn estimate_tokens(&self, text: &str) -> usize {
        estimate_tokens(text)
    }

    /// Prune the history in place and return the bounded window.
    ///
    /// First hard-caps to the most recent `max_messages`, then trims from
    /// the front until the cumulative estimated cost of the remaining
    /// messages plus `system_prompt_tokens` is within the budget. Pruning
    /// an already-pruned, in-budget history is a no-op.
    pub fn prune(&mut self, system_prompt_tokens: usize) -> &[ChatMessage] {
        if self.history.len() > self.max_messages {
            let excess = self.history.len() - self.max_messages;
            self.history.drain(..excess);
        }

        while self.history.len() > 1
            && system_prompt_tokens + estimate_messages_tokens(&self.history)
                > self.token_budget
        {
            self.history.remove(0);
        }

        &self.history
    }
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::new()
    }
}
