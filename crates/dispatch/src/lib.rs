//! Action dispatch — maps classified intents onto registered handlers.
//!
//! The dispatcher enforces handler preconditions (producing a clarifying
//! follow-up prompt when entities are missing), converts handler errors
//! into failure results, and never propagates an error to its caller.
//! Reserved handlers for `unknown` and `search` intents defer the request
//! to the reasoning loop instead of treating it as a terminal response.

pub mod dispatcher;
pub mod handlers;

pub use dispatcher::ActionDispatcher;
pub use handlers::{PassToAgentHandler, ToolBackedHandler};
