//! Tool registry with per-tool failure isolation.
//!
//! The registry owns every tool descriptor plus its transient failure
//! state. A failing tool backs off exponentially (1s · 2^attempts, capped
//! at 30s) and, once its retry budget is exhausted, disappears from the
//! prompt tool list so the model is not invited to retry it. Exhausted
//! tools remain invocable through the dispatcher's direct path until a
//! success or an explicit reset clears them.
//!
//! Shared mutable state here is owned by one assistant instance; runs are
//! serialized per conversation, interior mutability exists for API
//! ergonomics rather than concurrent runs.

use crate::clock::{Clock, SystemClock};
use crate::error::ToolError;
use crate::tool::{Tool, ToolCall, ToolDescriptor, ToolOutput};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Base backoff unit: 1 second.
const BACKOFF_BASE_MS: u64 = 1000;
/// Backoff ceiling: 30 seconds.
const BACKOFF_CAP_MS: u64 = 30_000;

/// Transient per-tool failure state.
///
/// Created on first failure, mutated on each subsequent failure, removed
/// on success or explicit reset.
#[derive(Debug, Clone)]
struct ToolFailure {
    attempts: u32,
    last_error: String,
    backoff_until: Instant,
}

/// Per-tool health snapshot for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolStatus {
    pub name: String,
    pub available: bool,
    pub failure_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// A registry of available tools with failure/backoff bookkeeping.
///
/// The reasoning loop uses this to:
/// 1. Get descriptors of healthy tools for the system prompt
/// 2. Look up and execute tools when the model requests them
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
    failures: Mutex<HashMap<String, ToolFailure>>,
    online: AtomicBool,
    clock: Arc<dyn Clock>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a registry with an injected clock (deterministic backoff in
    /// tests).
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            online: AtomicBool::new(true),
            clock,
        }
    }

    /// Register a tool. Replaces any existing tool with the same name and
    /// clears the replaced entry's failure state.
    pub fn register(&self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.write().unwrap().insert(name.clone(), tool.into());
        self.failures.lock().unwrap().remove(&name);
    }

    /// Remove a tool and its failure state.
    pub fn unregister(&self, name: &str) {
        self.tools.write().unwrap().remove(name);
        self.failures.lock().unwrap().remove(name);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().unwrap().get(name).cloned()
    }

    /// Update the connectivity flag. Network-requiring tools are filtered
    /// out of listings while offline.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    /// Descriptors of every tool usable right now, excluding tools that
    /// need the network while the system is offline. Sorted by name for
    /// deterministic prompt construction.
    pub fn list_available(&self) -> Vec<ToolDescriptor> {
        let online = self.is_online();
        let mut descriptors: Vec<ToolDescriptor> = self
            .tools
            .read()
            .unwrap()
            .values()
            .filter(|t| online || !t.requires_network())
            .map(|t| t.to_descriptor())
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Descriptors for the next system prompt: available tools minus any
    /// whose retry budget is exhausted, so the model is not invited to
    /// retry a broken tool.
    pub fn prompt_tools(&self) -> Vec<ToolDescriptor> {
        let exhausted = self.exhausted_tools();
        self.list_available()
            .into_iter()
            .filter(|d| !exhausted.contains(&d.name))
            .collect()
    }

    /// Names of tools whose failure attempts have reached their retry
    /// budget.
    pub fn exhausted_tools(&self) -> Vec<String> {
        let tools = self.tools.read().unwrap();
        let failures = self.failures.lock().unwrap();
        failures
            .iter()
            .filter(|(name, f)| {
                tools
                    .get(*name)
                    .is_some_and(|t| f.attempts >= t.max_retries())
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// All registered tool names, sorted.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    /// Per-tool health snapshot, sorted by name.
    pub fn status(&self) -> Vec<ToolStatus> {
        let online = self.is_online();
        let now = self.clock.now();
        let tools = self.tools.read().unwrap();
        let failures = self.failures.lock().unwrap();

        let mut statuses: Vec<ToolStatus> = tools
            .values()
            .map(|tool| {
                let failure = failures.get(tool.name());
                let exhausted = failure.is_some_and(|f| f.attempts >= tool.max_retries());
                let in_backoff = failure.is_some_and(|f| f.backoff_until > now);
                let network_ok = online || !tool.requires_network();
                ToolStatus {
                    name: tool.name().to_string(),
                    available: network_ok && !exhausted && !in_backoff,
                    failure_count: failure.map(|f| f.attempts).unwrap_or(0),
                    last_error: failure.map(|f| f.last_error.clone()),
                }
            })
            .collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    /// Clear all failure state (e.g., connectivity restored).
    pub fn reset_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Clear failure state for a single tool.
    pub fn reset_failures_for(&self, name: &str) {
        self.failures.lock().unwrap().remove(name);
    }

    /// Remaining backoff for a tool, if it is currently inside its window.
    pub fn backoff_remaining(&self, name: &str) -> Option<Duration> {
        let now = self.clock.now();
        self.failures
            .lock()
            .unwrap()
            .get(name)
            .and_then(|f| f.backoff_until.checked_duration_since(now))
            .filter(|d| !d.is_zero())
    }

    /// Execute a tool call on the reasoning-loop path: backoff, exhaustion,
    /// and connectivity are all enforced.
    pub async fn execute(&self, call: &ToolCall) -> ToolOutput {
        self.run(call, false).await
    }

    /// Execute a tool call on the dispatcher's direct path: exhaustion is
    /// bypassed (exhausted tools stay directly invocable until reset), but
    /// backoff windows and connectivity still apply.
    pub async fn execute_direct(&self, call: &ToolCall) -> ToolOutput {
        self.run(call, true).await
    }

    async fn run(&self, call: &ToolCall, bypass_exhaustion: bool) -> ToolOutput {
        let Some(tool) = self.get(&call.name) else {
            return ToolOutput::from_error(&ToolError::NotFound(call.name.clone()));
        };

        if tool.requires_network() && !self.is_online() {
            return ToolOutput::from_error(&ToolError::NetworkUnavailable(call.name.clone()));
        }

        let now = self.clock.now();
        {
            let failures = self.failures.lock().unwrap();
            if let Some(failure) = failures.get(&call.name) {
                if failure.backoff_until > now {
                    let remaining_ms =
                        (failure.backoff_until - now).as_millis() as u64;
                    return ToolOutput::from_error(&ToolError::InBackoff {
                        tool_name: call.name.clone(),
                        remaining_ms,
                    });
                }
                if !bypass_exhaustion && failure.attempts >= tool.max_retries() {
                    return ToolOutput::from_error(&ToolError::RetriesExceeded {
                        tool_name: call.name.clone(),
                        attempts: failure.attempts,
                    });
                }
            }
        }

        // Race execute against the tool's deadline. `tokio::time::timeout`
        // drops the losing future, so a timed-out call is actually
        // cancelled rather than left running in the background.
        let timeout = tool.timeout();
        let outcome =
            match tokio::time::timeout(timeout, tool.execute(call.arguments.clone())).await {
                Ok(Ok(output)) => output,
                Ok(Err(e)) => ToolOutput::from_error(&e),
                Err(_) => ToolOutput::from_error(&ToolError::Timeout {
                    tool_name: call.name.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                }),
            };

        self.record(&call.name, &outcome);
        outcome
    }

    /// Update failure state from an execution outcome. Success clears the
    /// tool's failure state entirely; a retryable failure advances the
    /// exponential backoff.
    fn record(&self, name: &str, outcome: &ToolOutput) {
        let mut failures = self.failures.lock().unwrap();

        if outcome.success {
            if failures.remove(name).is_some() {
                debug!(tool = name, "Tool recovered, failure state cleared");
            }
            return;
        }

        if !outcome.retryable {
            return;
        }

        let now = self.clock.now();
        let error = outcome
            .error
            .clone()
            .unwrap_or_else(|| "unknown error".into());
        let entry = failures.entry(name.to_string()).or_insert(ToolFailure {
            attempts: 0,
            last_error: String::new(),
            backoff_until: now,
        });
        entry.attempts += 1;
        entry.last_error = error;
        let backoff_ms = BACKOFF_BASE_MS
            .saturating_mul(1u64 << entry.attempts.min(31))
            .min(BACKOFF_CAP_MS);
        entry.backoff_until = now + Duration::from_millis(backoff_ms);

        warn!(
            tool = name,
            attempts = entry.attempts,
            backoff_ms,
            error = %entry.last_error,
            "Tool failure recorded"
        );
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    /// A tool that fails a configurable number of times before succeeding.
    struct FlakyTool {
        name: &'static str,
        failures_before_success: u32,
        calls: AtomicU32,
        requires_network: bool,
    }

    impl FlakyTool {
        fn new(name: &'static str, failures_before_success: u32) -> Self {
            Self {
                name,
                failures_before_success,
                calls: AtomicU32::new(0),
                requires_network: false,
            }
        }

        fn always_failing(name: &'static str) -> Self {
            Self::new(name, u32::MAX)
        }

        fn networked(name: &'static str) -> Self {
            Self {
                requires_network: true,
                ..Self::new(name, 0)
            }
        }
    }

    #[async_trait]
    impl Tool for FlakyTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "A flaky test tool"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        fn requires_network(&self) -> bool {
            self.requires_network
        }
        async fn execute(
            &self,
            _arguments: serde_json::Value,
        ) -> std::result::Result<ToolOutput, ToolError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Ok(ToolOutput::fail("transient failure"))
            } else {
                Ok(ToolOutput::ok("done"))
            }
        }
    }

    /// A tool that never returns within its deadline.
    struct HangingTool;

    #[async_trait]
    impl Tool for HangingTool {
        fn name(&self) -> &str {
            "hanging"
        }
        fn description(&self) -> &str {
            "Hangs forever"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        fn timeout(&self) -> Duration {
            Duration::from_millis(20)
        }
        async fn execute(
            &self,
            _arguments: serde_json::Value,
        ) -> std::result::Result<ToolOutput, ToolError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    fn setup() -> (Arc<ManualClock>, ToolRegistry) {
        let clock = Arc::new(ManualClock::new());
        let registry = ToolRegistry::with_clock(clock.clone());
        (clock, registry)
    }

    #[tokio::test]
    async fn backoff_grows_exponentially_and_caps() {
        let (clock, registry) = setup();
        registry.register(Box::new(FlakyTool::always_failing("bad")));
        let call = ToolCall::new("bad", serde_json::json!({}));

        // 1st failure → 2s window
        let out = registry.execute_direct(&call).await;
        assert!(!out.success);
        let remaining = registry.backoff_remaining("bad").unwrap();
        assert_eq!(remaining, Duration::from_millis(2000));

        // 2nd failure → 4s window
        clock.advance(Duration::from_millis(2000));
        registry.execute_direct(&call).await;
        assert_eq!(
            registry.backoff_remaining("bad").unwrap(),
            Duration::from_millis(4000)
        );

        // Keep failing until the cap kicks in
        for _ in 0..6 {
            clock.advance(Duration::from_secs(40));
            registry.execute_direct(&call).await;
        }
        assert_eq!(
            registry.backoff_remaining("bad").unwrap(),
            Duration::from_millis(30_000)
        );
    }

    #[tokio::test]
    async fn success_clears_failure_state() {
        let (clock, registry) = setup();
        registry.register(Box::new(FlakyTool::new("flaky", 1)));
        let call = ToolCall::new("flaky", serde_json::json!({}));

        let out = registry.execute(&call).await;
        assert!(!out.success);
        assert_eq!(registry.status()[0].failure_count, 1);

        clock.advance(Duration::from_millis(2001));
        let out = registry.execute(&call).await;
        assert!(out.success);
        assert_eq!(registry.status()[0].failure_count, 0);
        assert!(registry.backoff_remaining("flaky").is_none());
    }

    #[tokio::test]
    async fn backoff_window_refuses_without_invoking() {
        let (_, registry) = setup();
        let tool = Box::new(FlakyTool::always_failing("bad"));
        registry.register(tool);
        let call = ToolCall::new("bad", serde_json::json!({}));

        registry.execute(&call).await;
        // Immediately again — inside the 2s window
        let out = registry.execute(&call).await;
        assert!(!out.success);
        assert!(out.output.contains("backoff"));
        assert!(!out.retryable);
        // Attempts unchanged: the refusal did not invoke the tool
        assert_eq!(registry.status()[0].failure_count, 1);
    }

    #[tokio::test]
    async fn exhausted_tool_hidden_from_prompt_but_in_status() {
        let (clock, registry) = setup();
        registry.register(Box::new(FlakyTool::always_failing("bad")));
        registry.register(Box::new(FlakyTool::new("good", 0)));
        let call = ToolCall::new("bad", serde_json::json!({}));

        // Default max_retries = 2: two recorded failures exhaust the tool.
        registry.execute(&call).await;
        clock.advance(Duration::from_millis(2001));
        registry.execute(&call).await;

        let prompt_names: Vec<String> =
            registry.prompt_tools().into_iter().map(|d| d.name).collect();
        assert_eq!(prompt_names, vec!["good"]);

        let status = registry.status();
        let bad = status.iter().find(|s| s.name == "bad").unwrap();
        assert!(!bad.available);
        assert_eq!(bad.failure_count, 2);
        assert!(bad.last_error.is_some());
    }

    #[tokio::test]
    async fn exhausted_tool_refused_on_loop_path_but_direct_still_runs() {
        let (clock, registry) = setup();
        registry.register(Box::new(FlakyTool::new("flaky", 2)));
        let call = ToolCall::new("flaky", serde_json::json!({}));

        registry.execute(&call).await;
        clock.advance(Duration::from_millis(2001));
        registry.execute(&call).await;
        clock.advance(Duration::from_millis(4001));

        // Loop path refuses
        let out = registry.execute(&call).await;
        assert!(!out.success);
        assert!(out.output.contains("retries exceeded") || out.output.contains("Retries"));

        // Direct path invokes the tool (3rd call succeeds) and clears state
        let out = registry.execute_direct(&call).await;
        assert!(out.success);
        assert_eq!(registry.status()[0].failure_count, 0);
    }

    #[tokio::test]
    async fn offline_hides_network_tools_and_refuses_execution() {
        let (_, registry) = setup();
        registry.register(Box::new(FlakyTool::networked("web_search")));
        registry.register(Box::new(FlakyTool::new("local_tool", 0)));

        registry.set_online(false);
        let names: Vec<String> = registry
            .list_available()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["local_tool"]);

        let out = registry
            .execute(&ToolCall::new("web_search", serde_json::json!({})))
            .await;
        assert!(!out.success);
        assert!(!out.retryable);
        assert_eq!(registry.status().len(), 2);
        // Offline refusal does not advance backoff
        let ws = registry
            .status()
            .into_iter()
            .find(|s| s.name == "web_search")
            .unwrap();
        assert_eq!(ws.failure_count, 0);

        registry.set_online(true);
        let out = registry
            .execute(&ToolCall::new("web_search", serde_json::json!({})))
            .await;
        assert!(out.success);
    }

    #[tokio::test]
    async fn timeout_is_recorded_as_retryable_failure() {
        let (_, registry) = setup();
        registry.register(Box::new(HangingTool));

        let out = registry
            .execute(&ToolCall::new("hanging", serde_json::json!({})))
            .await;
        assert!(!out.success);
        assert!(out.output.contains("timed out"));
        assert_eq!(registry.status()[0].failure_count, 1);
    }

    #[tokio::test]
    async fn unknown_tool_is_not_recorded() {
        let (_, registry) = setup();
        let out = registry
            .execute(&ToolCall::new("ghost", serde_json::json!({})))
            .await;
        assert!(!out.success);
        assert!(!out.retryable);
        assert!(registry.status().is_empty());
    }

    #[tokio::test]
    async fn register_is_upsert_and_clears_failures() {
        let (_, registry) = setup();
        registry.register(Box::new(FlakyTool::always_failing("t")));
        registry
            .execute(&ToolCall::new("t", serde_json::json!({})))
            .await;
        assert_eq!(registry.status()[0].failure_count, 1);

        // Re-registering replaces the entry and clears failure state.
        registry.register(Box::new(FlakyTool::new("t", 0)));
        assert_eq!(registry.status()[0].failure_count, 0);

        let out = registry
            .execute(&ToolCall::new("t", serde_json::json!({})))
            .await;
        assert!(out.success);
    }

    #[tokio::test]
    async fn reset_failures_restores_prompt_visibility() {
        let (clock, registry) = setup();
        registry.register(Box::new(FlakyTool::always_failing("bad")));
        let call = ToolCall::new("bad", serde_json::json!({}));

        registry.execute(&call).await;
        clock.advance(Duration::from_millis(2001));
        registry.execute(&call).await;
        assert!(registry.prompt_tools().is_empty());

        registry.reset_failures();
        assert_eq!(registry.prompt_tools().len(), 1);
    }

    #[tokio::test]
    async fn unregister_removes_tool_and_state() {
        let (_, registry) = setup();
        registry.register(Box::new(FlakyTool::always_failing("t")));
        registry
            .execute(&ToolCall::new("t", serde_json::json!({})))
            .await;

        registry.unregister("t");
        assert!(registry.get("t").is_none());
        assert!(registry.status().is_empty());
    }
}
