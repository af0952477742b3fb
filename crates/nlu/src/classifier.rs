//! The intent classifier — a tagged pattern dispatcher.
//!
//! The table below is data: each entry pairs an intent kind with its
//! patterns and a pure extraction function. Matching and ranking live in
//! one generic scan so adding an intent kind only ever touches the table.
//!
//! Confidence is `min(1, coverage * 0.8 + entity_bonus + 0.1)` where
//! coverage is the matched fraction of the input and the bonus is 0.1 per
//! non-empty capture group. Entries are scanned in fixed priority order;
//! for `parse` the first match wins, `parse_all` collects every matching
//! entry ranked by confidence.

use crate::time::{resolve_datetime, resolve_duration};
use chrono::{DateTime, Local};
use regex_lite::{Captures, Regex};
use tracing::trace;
use vesper_core::intent::{Entities, IntentKind, ParsedIntent};

/// A recognizable time phrase, used as a suffix group in several patterns.
const TIME_PHRASE: &str = r"in\s+\d+\s+(?:minutes?|mins?|hours?|hrs?|days?|weeks?|months?)|(?:tomorrow|today|tonight)(?:\s+(?:morning|afternoon|evening|night))?(?:\s+at\s+\d{1,2}(?::\d{2})?\s*(?:am|pm))?|at\s+\d{1,2}(?::\d{2})?\s*(?:am|pm)|later";

type Extractor = fn(&Captures<'_>, DateTime<Local>) -> Entities;

struct TableEntry {
    kind: IntentKind,
    patterns: Vec<Regex>,
    extract: Extractor,
}

/// Pattern-table natural-language intent classifier.
pub struct IntentClassifier {
    table: Vec<TableEntry>,
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self {
            table: build_table(),
        }
    }

    /// Classify an utterance, returning the single best match.
    pub fn parse(&self, text: &str) -> ParsedIntent {
        self.parse_at(text, Local::now())
    }

    /// Classify with an explicit `now` for deterministic time resolution.
    pub fn parse_at(&self, text: &str, now: DateTime<Local>) -> ParsedIntent {
        let trimmed = text.trim();
        for entry in &self.table {
            if let Some(intent) = match_entry(entry, trimmed, now) {
                trace!(kind = %intent.kind, confidence = intent.confidence, "Intent matched");
                return intent;
            }
        }
        ParsedIntent::unknown(trimmed)
    }

    /// Classify an utterance, returning every match ranked by confidence.
    pub fn parse_all(&self, text: &str) -> Vec<ParsedIntent> {
        self.parse_all_at(text, Local::now())
    }

    /// `parse_all` with an explicit `now`.
    pub fn parse_all_at(&self, text: &str, now: DateTime<Local>) -> Vec<ParsedIntent> {
        let trimmed = text.trim();
        let mut matches: Vec<ParsedIntent> = self
            .table
            .iter()
            .filter_map(|entry| match_entry(entry, trimmed, now))
            .collect();
        // Stable sort: ties keep table priority order.
        matches.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches
    }

    /// Whether the utterance maps to a known intent with usable confidence.
    pub fn is_actionable(&self, text: &str) -> bool {
        let intent = self.parse(text);
        intent.kind != IntentKind::Unknown && intent.confidence > 0.5
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Try an entry's patterns in order against the trimmed input.
fn match_entry(entry: &TableEntry, trimmed: &str, now: DateTime<Local>) -> Option<ParsedIntent> {
    if trimmed.is_empty() {
        return None;
    }
    for pattern in &entry.patterns {
        if let Some(caps) = pattern.captures(trimmed) {
            let entities = (entry.extract)(&caps, now);
            return Some(ParsedIntent {
                kind: entry.kind,
                confidence: confidence(&caps, trimmed),
                raw: trimmed.to_string(),
                entities,
            });
        }
    }
    None
}

/// `min(1, coverage * 0.8 + 0.1 per non-empty group + 0.1)`.
fn confidence(caps: &Captures<'_>, input: &str) -> f32 {
    let matched_len = caps.get(0).map(|m| m.as_str().len()).unwrap_or(0);
    let coverage = matched_len as f32 / input.len() as f32;
    let entity_bonus = 0.1
        * (1..caps.len())
            .filter(|&i| caps.get(i).is_some_and(|g| !g.as_str().is_empty()))
            .count() as f32;
    (coverage * 0.8 + entity_bonus + 0.1).min(1.0)
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("intent table pattern must compile")
}

fn group(caps: &Captures<'_>, i: usize) -> Option<String> {
    caps.get(i)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

// ── Extraction functions (one per table entry) ────────────────────────────

fn extract_reminder(caps: &Captures<'_>, now: DateTime<Local>) -> Entities {
    Entities {
        subject: group(caps, 1),
        datetime: group(caps, 2).and_then(|t| resolve_datetime(&t, now)),
        ..Entities::default()
    }
}

fn extract_message(caps: &Captures<'_>, _now: DateTime<Local>) -> Entities {
    Entities {
        contact: group(caps, 1),
        body: group(caps, 2),
        ..Entities::default()
    }
}

fn extract_note(caps: &Captures<'_>, _now: DateTime<Local>) -> Entities {
    Entities {
        body: group(caps, 1),
        ..Entities::default()
    }
}

fn extract_calendar(caps: &Captures<'_>, now: DateTime<Local>) -> Entities {
    Entities {
        subject: group(caps, 1),
        datetime: group(caps, 2).and_then(|t| resolve_datetime(&t, now)),
        ..Entities::default()
    }
}

fn extract_timer(caps: &Captures<'_>, _now: DateTime<Local>) -> Entities {
    let duration = match (group(caps, 1), group(caps, 2)) {
        (Some(value), Some(unit)) => value
            .parse::<u64>()
            .ok()
            .and_then(|v| resolve_duration(v, &unit)),
        _ => None,
    };
    Entities {
        duration,
        ..Entities::default()
    }
}

fn extract_app_launch(caps: &Captures<'_>, _now: DateTime<Local>) -> Entities {
    Entities {
        app_name: group(caps, 1),
        ..Entities::default()
    }
}

fn extract_call(caps: &Captures<'_>, _now: DateTime<Local>) -> Entities {
    Entities {
        contact: group(caps, 1),
        ..Entities::default()
    }
}

fn extract_navigation(caps: &Captures<'_>, _now: DateTime<Local>) -> Entities {
    Entities {
        location: group(caps, 1),
        ..Entities::default()
    }
}

fn extract_search(caps: &Captures<'_>, _now: DateTime<Local>) -> Entities {
    Entities {
        query: group(caps, 1),
        ..Entities::default()
    }
}

fn extract_named_skill(caps: &Captures<'_>, _now: DateTime<Local>) -> Entities {
    Entities {
        skill_id: group(caps, 1),
        skill_args: group(caps, 2)
            .map(|args| args.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
        ..Entities::default()
    }
}

fn extract_toast_skill(caps: &Captures<'_>, _now: DateTime<Local>) -> Entities {
    Entities {
        skill_id: Some("show_toast".into()),
        skill_args: group(caps, 1).map(|msg| vec![msg]).unwrap_or_default(),
        ..Entities::default()
    }
}

fn extract_vibrate_skill(caps: &Captures<'_>, _now: DateTime<Local>) -> Entities {
    Entities {
        skill_id: Some("vibrate".into()),
        skill_args: group(caps, 1).map(|ms| vec![ms]).unwrap_or_default(),
        ..Entities::default()
    }
}

fn extract_battery_skill(_caps: &Captures<'_>, _now: DateTime<Local>) -> Entities {
    Entities {
        skill_id: Some("battery_status".into()),
        ..Entities::default()
    }
}

fn extract_toggle_verb_first(caps: &Captures<'_>, _now: DateTime<Local>) -> Entities {
    Entities {
        enable: group(caps, 1).map(|state| state.eq_ignore_ascii_case("on")),
        setting: group(caps, 2),
        ..Entities::default()
    }
}

fn extract_toggle_enable_disable(caps: &Captures<'_>, _now: DateTime<Local>) -> Entities {
    Entities {
        enable: group(caps, 1).map(|verb| verb.eq_ignore_ascii_case("enable")),
        setting: group(caps, 2),
        ..Entities::default()
    }
}

fn extract_toggle_setting_first(caps: &Captures<'_>, _now: DateTime<Local>) -> Entities {
    Entities {
        setting: group(caps, 1),
        enable: group(caps, 2).map(|state| state.eq_ignore_ascii_case("on")),
        ..Entities::default()
    }
}

// ── The table ─────────────────────────────────────────────────────────────

/// Build the priority-ordered intent table: reminders before messages
/// before notes before calendar events before timers before app-launch
/// before calls before navigation before generic search before
/// device-skill micro-commands before the settings-toggle catch-all.
fn build_table() -> Vec<TableEntry> {
    vec![
        TableEntry {
            kind: IntentKind::Reminder,
            patterns: vec![
                re(&format!(
                    r"(?i)^remind me (?:to |about )?(.+?)(?:\s+({TIME_PHRASE}))?$"
                )),
                re(&format!(
                    r"(?i)^set a reminder (?:to |for |about )?(.+?)(?:\s+({TIME_PHRASE}))?$"
                )),
            ],
            extract: extract_reminder,
        },
        TableEntry {
            kind: IntentKind::Message,
            patterns: vec![
                re(r"(?i)^send (?:a )?(?:message|text|msg) to (.+?)(?: (?:saying|that says|saying that|to say) (.+))?$"),
                re(r"(?i)^(?:text|message) (.+?)(?: (?:saying|that says|saying that|to say|and say) (.+))?$"),
            ],
            extract: extract_message,
        },
        TableEntry {
            kind: IntentKind::Note,
            patterns: vec![
                re(r"(?i)^(?:take|make) a note(?: (?:that|saying|to))? (.+)$"),
                re(r"(?i)^(?:note down|note|add a note(?: (?:that|saying))?) (.+)$"),
            ],
            extract: extract_note,
        },
        TableEntry {
            kind: IntentKind::CalendarEvent,
            patterns: vec![
                re(&format!(
                    r"(?i)^(?:schedule|add|create) (?:a |an )?(?:meeting|event|appointment)(?: (?:with|about|called|titled|for) (.+?))?(?:\s+({TIME_PHRASE}))?$"
                )),
                re(&format!(
                    r"(?i)^put (.+?) on (?:my |the )?calendar(?:\s+({TIME_PHRASE}))?$"
                )),
            ],
            extract: extract_calendar,
        },
        TableEntry {
            kind: IntentKind::Timer,
            patterns: vec![
                re(r"(?i)^(?:set |start )?(?:a )?(?:timer|countdown)(?: for)? (\d+)\s*(seconds?|secs?|minutes?|mins?|hours?|hrs?)$"),
            ],
            extract: extract_timer,
        },
        TableEntry {
            kind: IntentKind::AppLaunch,
            patterns: vec![re(r"(?i)^(?:open|launch|start) (?:the )?(.+?)(?: app)?$")],
            extract: extract_app_launch,
        },
        TableEntry {
            kind: IntentKind::Call,
            patterns: vec![
                re(r"(?i)^(?:call|phone|dial|ring) (.+)$"),
                re(r"(?i)^make a (?:phone )?call to (.+)$"),
            ],
            extract: extract_call,
        },
        TableEntry {
            kind: IntentKind::Navigation,
            patterns: vec![
                re(r"(?i)^(?:navigate(?: me)? to|take me to|directions to|give me directions to|how do i get to) (.+)$"),
            ],
            extract: extract_navigation,
        },
        TableEntry {
            kind: IntentKind::Search,
            patterns: vec![
                re(r"(?i)^(?:search(?: the web)?(?: for)?|google|look up|what is|what's|who is|who's) (.+?)\??$"),
            ],
            extract: extract_search,
        },
        TableEntry {
            kind: IntentKind::DeviceSkill,
            patterns: vec![re(r"(?i)^(?:run|trigger|do) skill ([\w-]+)(?: (.+))?$")],
            extract: extract_named_skill,
        },
        TableEntry {
            kind: IntentKind::DeviceSkill,
            patterns: vec![re(r"(?i)^(?:show (?:a )?toast(?: saying)?|toast) (.+)$")],
            extract: extract_toast_skill,
        },
        TableEntry {
            kind: IntentKind::DeviceSkill,
            patterns: vec![
                re(r"(?i)^(?:vibrate|buzz)(?: (?:the )?phone)?(?: for (\d+)\s*(?:ms|milliseconds?|seconds?))?$"),
            ],
            extract: extract_vibrate_skill,
        },
        TableEntry {
            kind: IntentKind::DeviceSkill,
            patterns: vec![re(r"(?i)^(?:check (?:the )?)?battery(?: status| level)?$")],
            extract: extract_battery_skill,
        },
        TableEntry {
            kind: IntentKind::SettingsToggle,
            patterns: vec![re(r"(?i)^turn (on|off) (?:the |my )?(.+)$")],
            extract: extract_toggle_verb_first,
        },
        TableEntry {
            kind: IntentKind::SettingsToggle,
            patterns: vec![re(r"(?i)^(enable|disable) (?:the |my )?(.+)$")],
            extract: extract_toggle_enable_disable,
        },
        TableEntry {
            kind: IntentKind::SettingsToggle,
            patterns: vec![re(r"(?i)^(?:set|switch) (?:the |my )?(.+?) (on|off)$")],
            extract: extract_toggle_setting_first,
        },
    ]
}
