//! Model response parsing for the THOUGHT/ACTION/ANSWER protocol.
//!
//! The instruction template mandates exactly one `ACTION: tool {json}` or
//! `ANSWER: text` per turn, preceded by a `THOUGHT:` line — but models
//! drift, so parsing is tolerant:
//!
//! - Action dialects tried in priority order: `tool_name {json}`,
//!   `tool_name()`, bare `tool_name`.
//! - A malformed JSON payload inside an ACTION line is logged and treated
//!   as "no action parsed".
//! - When both an ACTION and a trailing ANSWER appear, the action wins and
//!   the answer is discarded as presumed hallucination — the model could
//!   not yet know the tool's result. This is a tunable policy, not a hard
//!   invariant (`prefer_action_over_answer`).
//! - Slightly wrong tool names are tolerated via prefix matching and a
//!   bounded edit-distance check.

use regex_lite::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// An action extracted from a model response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAction {
    pub tool_name: String,
    pub params: serde_json::Value,
}

/// The structured interpretation of one model response.
#[derive(Debug, Clone, Default)]
pub struct ParsedResponse {
    pub thought: Option<String>,
    pub action: Option<ParsedAction>,
    pub answer: Option<String>,
}

fn thought_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*THOUGHT:\s*(.+)$").unwrap())
}

fn action_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*ACTION:\s*(.+)$").unwrap())
}

fn answer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*ANSWER:\s*").unwrap())
}

/// Protocol parser with the action-over-answer policy.
#[derive(Debug, Clone)]
pub struct ResponseParser {
    prefer_action_over_answer: bool,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            prefer_action_over_answer: true,
        }
    }

    /// Override the action-over-answer policy.
    pub fn with_action_preference(mut self, prefer: bool) -> Self {
        self.prefer_action_over_answer = prefer;
        self
    }

    /// Parse a raw model response into its protocol parts.
    pub fn parse(&self, text: &str) -> ParsedResponse {
        let thought = thought_re()
            .captures(text)
            .map(|c| c[1].trim().to_string())
            .filter(|t| !t.is_empty());

        let action = action_re()
            .captures(text)
            .and_then(|c| parse_action_payload(c[1].trim()));

        let mut answer = answer_re()
            .find(text)
            .map(|m| text[m.end()..].trim().to_string())
            .filter(|a| !a.is_empty());

        if action.is_some() && answer.is_some() && self.prefer_action_over_answer {
            debug!("Discarding trailing answer alongside an action (presumed hallucination)");
            answer = None;
        }

        ParsedResponse {
            thought,
            action,
            answer,
        }
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the payload of an ACTION line, trying the dialects in priority
/// order: `tool_name {json}`, `tool_name()`, bare `tool_name`.
fn parse_action_payload(payload: &str) -> Option<ParsedAction> {
    let payload = payload.trim();

    // Dialect 1: tool_name {json}
    if let Some(brace) = payload.find('{') {
        let name = payload[..brace].trim();
        if !is_tool_name(name) {
            return None;
        }
        return match serde_json::from_str::<serde_json::Value>(payload[brace..].trim()) {
            Ok(params) if params.is_object() => Some(ParsedAction {
                tool_name: name.to_string(),
                params,
            }),
            Ok(_) | Err(_) => {
                // Malformed payload: logged, treated as "no action parsed"
                // so the caller falls back to answer-or-continue behavior.
                warn!(payload, "Malformed action payload, ignoring action");
                None
            }
        };
    }

    // Dialect 2: tool_name()
    if let Some(name) = payload.strip_suffix("()").map(str::trim) {
        if is_tool_name(name) {
            return Some(ParsedAction {
                tool_name: name.to_string(),
                params: serde_json::json!({}),
            });
        }
        return None;
    }

    // Dialect 3: bare tool_name
    if is_tool_name(payload) {
        return Some(ParsedAction {
            tool_name: payload.to_string(),
            params: serde_json::json!({}),
        });
    }

    None
}

fn is_tool_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Strip protocol prefixes from a raw response so it can serve as a
/// best-effort final answer.
pub fn sanitize_raw(text: &str) -> String {
    text.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            ["THOUGHT:", "ACTION:", "ANSWER:", "OBSERVATION:"]
                .iter()
                .find_map(|prefix| trimmed.strip_prefix(prefix))
                .unwrap_or(trimmed)
                .trim()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolve a possibly-misspelled tool name against the registered names:
/// exact match, then prefix matching, then a bounded edit-distance check
/// (distance ≤ 2 over names differing in length by ≤ 2).
pub fn resolve_tool_name(requested: &str, known: &[String]) -> Option<String> {
    if requested.is_empty() {
        return None;
    }
    if known.iter().any(|k| k == requested) {
        return Some(requested.to_string());
    }

    let mut prefix_matches: Vec<&String> = known
        .iter()
        .filter(|k| k.starts_with(requested) || requested.starts_with(k.as_str()))
        .collect();
    prefix_matches.sort();
    if let Some(name) = prefix_matches.first() {
        return Some((*name).clone());
    }

    let mut candidates: Vec<(usize, &String)> = known
        .iter()
        .filter(|k| k.len().abs_diff(requested.len()) <= 2)
        .map(|k| (levenshtein(requested, k), k))
        .filter(|(d, _)| *d <= 2)
        .collect();
    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    candidates.first().map(|(_, name)| (*name).clone())
}

/// Classic two-row Levenshtein distance.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(prev[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ResponseParser {
        ResponseParser::new()
    }

    #[test]
    fn parses_thought_and_action() {
        let response = parser().parse(
            "THOUGHT: I should check the weather\nACTION: get_weather {\"location\": \"Tokyo\"}",
        );
        assert_eq!(
            response.thought.as_deref(),
            Some("I should check the weather")
        );
        let action = response.action.unwrap();
        assert_eq!(action.tool_name, "get_weather");
        assert_eq!(action.params["location"], "Tokyo");
        assert!(response.answer.is_none());
    }

    #[test]
    fn parses_answer() {
        let response = parser().parse("THOUGHT: easy\nANSWER: It's 18°C in Tokyo.");
        assert!(response.action.is_none());
        assert_eq!(response.answer.as_deref(), Some("It's 18°C in Tokyo."));
    }

    #[test]
    fn action_wins_over_trailing_answer() {
        let response = parser().parse(
            "THOUGHT: hmm\nACTION: get_weather {}\nANSWER: The weather is probably fine.",
        );
        assert!(response.action.is_some());
        assert!(response.answer.is_none());
    }

    #[test]
    fn answer_kept_when_policy_disabled() {
        let parser = ResponseParser::new().with_action_preference(false);
        let response =
            parser.parse("ACTION: get_weather {}\nANSWER: The weather is probably fine.");
        assert!(response.action.is_some());
        assert_eq!(
            response.answer.as_deref(),
            Some("The weather is probably fine.")
        );
    }

    #[test]
    fn action_dialect_empty_parens() {
        let response = parser().parse("ACTION: battery_status()");
        let action = response.action.unwrap();
        assert_eq!(action.tool_name, "battery_status");
        assert_eq!(action.params, serde_json::json!({}));
    }

    #[test]
    fn action_dialect_bare_name() {
        let response = parser().parse("ACTION: battery_status");
        let action = response.action.unwrap();
        assert_eq!(action.tool_name, "battery_status");
    }

    #[test]
    fn malformed_json_means_no_action() {
        let response = parser().parse(
            "ACTION: get_weather {\"location\": oops}\nANSWER: fallback answer",
        );
        assert!(response.action.is_none());
        // With no action, the answer is not discarded.
        assert_eq!(response.answer.as_deref(), Some("fallback answer"));
    }

    #[test]
    fn non_object_json_is_malformed() {
        let response = parser().parse("ACTION: get_weather {\"location\": \"x\"} }");
        assert!(response.action.is_none());
    }

    #[test]
    fn multiline_answer_is_captured() {
        let response = parser().parse("ANSWER: line one\nline two");
        assert_eq!(response.answer.as_deref(), Some("line one\nline two"));
    }

    #[test]
    fn no_protocol_yields_nothing() {
        let response = parser().parse("I am just rambling without protocol.");
        assert!(response.thought.is_none());
        assert!(response.action.is_none());
        assert!(response.answer.is_none());
    }

    #[test]
    fn sanitize_strips_protocol_prefixes() {
        let cleaned = sanitize_raw(
            "THOUGHT: thinking\nSome plain text.\nANSWER: the actual point\n\n",
        );
        assert_eq!(cleaned, "thinking\nSome plain text.\nthe actual point");
    }

    #[test]
    fn resolve_exact() {
        let known = vec!["get_weather".to_string(), "show_toast".to_string()];
        assert_eq!(
            resolve_tool_name("get_weather", &known).as_deref(),
            Some("get_weather")
        );
    }

    #[test]
    fn resolve_prefix() {
        let known = vec!["get_weather".to_string()];
        assert_eq!(
            resolve_tool_name("get_weath", &known).as_deref(),
            Some("get_weather")
        );
        assert_eq!(
            resolve_tool_name("get_weather_now", &known).as_deref(),
            Some("get_weather")
        );
    }

    #[test]
    fn resolve_edit_distance_typo() {
        let known = vec!["get_weather".to_string(), "show_toast".to_string()];
        assert_eq!(
            resolve_tool_name("get_weathr", &known).as_deref(),
            Some("get_weather")
        );
        assert_eq!(
            resolve_tool_name("show_tost", &known).as_deref(),
            Some("show_toast")
        );
    }

    #[test]
    fn resolve_rejects_distant_names() {
        let known = vec!["get_weather".to_string()];
        assert!(resolve_tool_name("open_app", &known).is_none());
        assert!(resolve_tool_name("", &known).is_none());
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("abc", "abd"), 1);
        assert_eq!(levenshtein("abc", "ab"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }
}
