//! Configuration loading, validation, and management for Vesper.
//!
//! Loads configuration from `~/.vesper/config.toml` with environment
//! variable overrides. Validates all settings at startup. Secrets are
//! redacted from `Debug` output.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
///
/// Maps directly to `~/.vesper/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Reasoning loop settings
    #[serde(default)]
    pub orchestrator: OrchestratorSection,

    /// Inference backend settings
    #[serde(default)]
    pub backends: BackendsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorSection {
    /// Iteration cap per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Token budget for prompt construction (history + system prompt)
    #[serde(default = "default_context_budget")]
    pub context_budget_tokens: usize,

    /// Hard cap on persisted history length
    #[serde(default = "default_history_max")]
    pub history_max_messages: usize,

    /// Character budget for OBSERVATION turns
    #[serde(default = "default_observation_limit")]
    pub observation_limit_chars: usize,

    /// Confidence gate for the dispatch short-circuit
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-response completion cap (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            context_budget_tokens: default_context_budget(),
            history_max_messages: default_history_max(),
            observation_limit_chars: default_observation_limit(),
            confidence_threshold: default_confidence_threshold(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct BackendsSection {
    /// Which backend to prefer: "remote" or "local"
    #[serde(default = "default_prefer")]
    pub prefer: String,

    #[serde(default)]
    pub remote: RemoteBackendConfig,

    #[serde(default)]
    pub local: LocalBackendConfig,
}

impl Default for BackendsSection {
    fn default() -> Self {
        Self {
            prefer: default_prefer(),
            remote: RemoteBackendConfig::default(),
            local: LocalBackendConfig::default(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RemoteBackendConfig {
    #[serde(default = "default_remote_url")]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_remote_model")]
    pub model: String,
}

impl Default for RemoteBackendConfig {
    fn default() -> Self {
        Self {
            url: default_remote_url(),
            api_key: None,
            model: default_remote_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalBackendConfig {
    #[serde(default = "default_local_url")]
    pub url: String,

    #[serde(default = "default_local_model")]
    pub model: String,
}

impl Default for LocalBackendConfig {
    fn default() -> Self {
        Self {
            url: default_local_url(),
            model: default_local_model(),
        }
    }
}

fn default_max_iterations() -> u32 {
    5
}
fn default_context_budget() -> usize {
    1800
}
fn default_history_max() -> usize {
    10
}
fn default_observation_limit() -> usize {
    500
}
fn default_confidence_threshold() -> f32 {
    0.55
}
fn default_temperature() -> f32 {
    0.7
}
fn default_prefer() -> String {
    "remote".into()
}
fn default_remote_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_remote_model() -> String {
    "anthropic/claude-sonnet-4".into()
}
fn default_local_url() -> String {
    "http://localhost:11434/v1".into()
}
fn default_local_model() -> String {
    "qwen2.5:3b".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("orchestrator", &self.orchestrator)
            .field("backends", &self.backends)
            .finish()
    }
}

impl std::fmt::Debug for BackendsSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendsSection")
            .field("prefer", &self.prefer)
            .field("remote", &self.remote)
            .field("local", &self.local)
            .finish()
    }
}

impl std::fmt::Debug for RemoteBackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBackendConfig")
            .field("url", &self.url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .finish()
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            orchestrator: OrchestratorSection::default(),
            backends: BackendsSection::default(),
        }
    }
}

impl AssistantConfig {
    /// The default config file location: `~/.vesper/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        std::env::home_dir().map(|home| home.join(".vesper").join("config.toml"))
    }

    /// Load from a specific file, apply env overrides, and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: AssistantConfig = toml::from_str(&raw)?;
        config.apply_env_overrides();
        config.validate()?;
        debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load from the default path when present, otherwise fall back to
    /// defaults (still applying env overrides and validation).
    pub fn load_or_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path()
            && path.is_file()
        {
            return Self::load(&path);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Environment variables take precedence over file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("VESPER_REMOTE_API_KEY")
            && !key.is_empty()
        {
            self.backends.remote.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("VESPER_REMOTE_URL")
            && !url.is_empty()
        {
            self.backends.remote.url = url;
        }
        if let Ok(model) = std::env::var("VESPER_REMOTE_MODEL")
            && !model.is_empty()
        {
            self.backends.remote.model = model;
        }
        if let Ok(url) = std::env::var("VESPER_LOCAL_URL")
            && !url.is_empty()
        {
            self.backends.local.url = url;
        }
        if let Ok(model) = std::env::var("VESPER_LOCAL_MODEL")
            && !model.is_empty()
        {
            self.backends.local.model = model;
        }
        if let Ok(prefer) = std::env::var("VESPER_BACKEND")
            && !prefer.is_empty()
        {
            self.backends.prefer = prefer;
        }
    }

    /// Range-check every setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let orch = &self.orchestrator;
        if !(1..=20).contains(&orch.max_iterations) {
            return Err(ConfigError::Invalid(format!(
                "orchestrator.max_iterations must be in 1..=20, got {}",
                orch.max_iterations
            )));
        }
        if orch.context_budget_tokens < 256 {
            return Err(ConfigError::Invalid(format!(
                "orchestrator.context_budget_tokens must be at least 256, got {}",
                orch.context_budget_tokens
            )));
        }
        if orch.history_max_messages == 0 {
            return Err(ConfigError::Invalid(
                "orchestrator.history_max_messages must be positive".into(),
            ));
        }
        if !(0.0..=2.0).contains(&orch.temperature) {
            return Err(ConfigError::Invalid(format!(
                "orchestrator.temperature must be in 0.0..=2.0, got {}",
                orch.temperature
            )));
        }
        if !(0.0..=1.0).contains(&orch.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "orchestrator.confidence_threshold must be in 0.0..=1.0, got {}",
                orch.confidence_threshold
            )));
        }
        if self.backends.prefer != "remote" && self.backends.prefer != "local" {
            return Err(ConfigError::Invalid(format!(
                "backends.prefer must be \"remote\" or \"local\", got \"{}\"",
                self.backends.prefer
            )));
        }
        Ok(())
    }
}
