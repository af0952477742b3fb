//! Intent domain types.
//!
//! A `ParsedIntent` is a structured, typed interpretation of free-text user
//! input: an intent kind, a confidence score, and a sparse bag of extracted
//! entity slots. Intents are produced fresh per utterance by the classifier
//! and are immutable once returned.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The recognized intent categories, in classifier priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Reminder,
    Message,
    Note,
    CalendarEvent,
    Timer,
    AppLaunch,
    Call,
    Navigation,
    Search,
    DeviceSkill,
    SettingsToggle,
    Unknown,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Reminder => "reminder",
            IntentKind::Message => "message",
            IntentKind::Note => "note",
            IntentKind::CalendarEvent => "calendar_event",
            IntentKind::Timer => "timer",
            IntentKind::AppLaunch => "app_launch",
            IntentKind::Call => "call",
            IntentKind::Navigation => "navigation",
            IntentKind::Search => "search",
            IntentKind::DeviceSkill => "device_skill",
            IntentKind::SettingsToggle => "settings_toggle",
            IntentKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sparse bag of typed entity slots extracted from an utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    /// Resolved absolute time ("tomorrow at 9am" → tomorrow 09:00 local)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<DateTime<Local>>,

    /// Resolved duration ("for 10 minutes")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,

    /// Contact name ("text mom", "call dr. smith")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,

    /// Subject line of a reminder or event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Message/note body text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Application name for launch requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// Destination or place
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Free-text search query (also carries the raw input for Unknown)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Device-skill identifier for micro-commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<String>,

    /// Positional arguments for a device skill
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skill_args: Vec<String>,

    /// Setting name for toggle commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setting: Option<String>,

    /// Desired toggle state (true = on)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
}

/// A classified utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedIntent {
    /// The intent category
    pub kind: IntentKind,

    /// Classifier confidence in [0, 1]
    pub confidence: f32,

    /// The original (trimmed) input text
    pub raw: String,

    /// Extracted entity slots
    pub entities: Entities,
}

impl ParsedIntent {
    /// The fallback produced when no pattern matches: the whole input is
    /// preserved as a query so downstream consumers can still act on it.
    pub fn unknown(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            kind: IntentKind::Unknown,
            confidence: 0.0,
            entities: Entities {
                query: Some(raw.clone()),
                ..Entities::default()
            },
            raw,
        }
    }
}
