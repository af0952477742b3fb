//! Time-expression sub-parser.
//!
//! Resolves free-text time phrases into absolute local timestamps, trying
//! in priority order:
//!
//! (a) relative offsets — "in 20 minutes", "in 2 days"
//! (b) "tomorrow", optionally with an explicit clock time or a daypart
//!     (morning 09:00, afternoon 14:00, evening/night 19:00, default 09:00)
//! (c) "today"/"tonight" with an explicit time, tonight defaulting to 20:00
//! (d) a bare clock time, assumed today unless already past (rolls over)
//! (e) the literal "later" — one hour from now

use chrono::{DateTime, Days, Local, NaiveDate, TimeZone};
use regex_lite::Regex;
use std::sync::OnceLock;
use std::time::Duration;

fn relative_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bin\s+(\d+)\s+(minutes?|mins?|hours?|hrs?|days?|weeks?|months?)\b")
            .unwrap()
    })
}

fn clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").unwrap())
}

/// Resolve a free-text time phrase relative to `now`. Returns `None` when
/// no recognizable expression is present.
pub fn resolve_datetime(text: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    let lower = text.to_lowercase();

    // (a) Relative offset
    if let Some(caps) = relative_re().captures(&lower) {
        let amount: u64 = caps[1].parse().ok()?;
        let unit = &caps[2];
        let offset = match unit.chars().next()? {
            'm' if unit.starts_with("mo") => chrono::Duration::days(30 * amount as i64),
            'm' => chrono::Duration::minutes(amount as i64),
            'h' => chrono::Duration::hours(amount as i64),
            'd' => chrono::Duration::days(amount as i64),
            'w' => chrono::Duration::weeks(amount as i64),
            _ => return None,
        };
        return now.checked_add_signed(offset);
    }

    // (b) Tomorrow, with explicit time or daypart
    if lower.contains("tomorrow") {
        let date = now.date_naive().checked_add_days(Days::new(1))?;
        let (hour, minute) = explicit_time(&lower)
            .or_else(|| daypart(&lower))
            .unwrap_or((9, 0));
        return at(date, hour, minute);
    }

    // (c) Today / tonight
    if lower.contains("tonight") {
        let (hour, minute) = explicit_time(&lower).unwrap_or((20, 0));
        return at(now.date_naive(), hour, minute);
    }
    if lower.contains("today") {
        let (hour, minute) = explicit_time(&lower)
            .or_else(|| daypart(&lower))
            .unwrap_or((9, 0));
        return at(now.date_naive(), hour, minute);
    }

    // (d) Bare clock time — today, rolling to tomorrow when already past
    if let Some((hour, minute)) = explicit_time(&lower) {
        let candidate = at(now.date_naive(), hour, minute)?;
        if candidate <= now {
            let date = now.date_naive().checked_add_days(Days::new(1))?;
            return at(date, hour, minute);
        }
        return Some(candidate);
    }

    // (e) "later" — an hour out
    if lower.contains("later") {
        return now.checked_add_signed(chrono::Duration::hours(1));
    }

    None
}

/// Resolve a timer-style duration from a value and a unit word.
pub fn resolve_duration(value: u64, unit: &str) -> Option<Duration> {
    let unit = unit.to_lowercase();
    let secs = match unit.chars().next()? {
        's' => value,
        'm' => value * 60,
        'h' => value * 3600,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}

/// Extract an explicit `H[:MM] am/pm` clock time.
fn explicit_time(text: &str) -> Option<(u32, u32)> {
    let caps = clock_re().captures(text)?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps.get(2).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    if hour > 12 || minute > 59 {
        return None;
    }
    let meridiem = caps[3].to_lowercase();
    if meridiem == "pm" && hour != 12 {
        hour += 12;
    } else if meridiem == "am" && hour == 12 {
        hour = 0;
    }
    Some((hour, minute))
}

/// Map a named daypart to its conventional hour.
fn daypart(text: &str) -> Option<(u32, u32)> {
    if text.contains("morning") {
        Some((9, 0))
    } else if text.contains("afternoon") {
        Some((14, 0))
    } else if text.contains("evening") || text.contains("night") {
        Some((19, 0))
    } else {
        None
    }
}

/// Build a local timestamp for a date and clock time, tolerating DST gaps.
fn at(date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Local>> {
    let naive = date.and_hms_opt(hour, minute, 0)?;
    Local.from_local_datetime(&naive).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn fixed_now() -> DateTime<Local> {
        // A Wednesday at 10:30 local
        Local.with_ymd_and_hms(2024, 6, 12, 10, 30, 0).unwrap()
    }

    #[test]
    fn relative_minutes() {
        let now = fixed_now();
        let dt = resolve_datetime("in 20 minutes", now).unwrap();
        assert_eq!(dt - now, chrono::Duration::minutes(20));
    }

    #[test]
    fn relative_hours_days_weeks() {
        let now = fixed_now();
        assert_eq!(
            resolve_datetime("in 2 hours", now).unwrap() - now,
            chrono::Duration::hours(2)
        );
        assert_eq!(
            resolve_datetime("in 3 days", now).unwrap() - now,
            chrono::Duration::days(3)
        );
        assert_eq!(
            resolve_datetime("in 1 week", now).unwrap() - now,
            chrono::Duration::weeks(1)
        );
        assert_eq!(
            resolve_datetime("in 1 month", now).unwrap() - now,
            chrono::Duration::days(30)
        );
    }

    #[test]
    fn tomorrow_default_morning() {
        let now = fixed_now();
        let dt = resolve_datetime("tomorrow", now).unwrap();
        assert_eq!(dt.date_naive(), now.date_naive().succ_opt().unwrap());
        assert_eq!((dt.hour(), dt.minute()), (9, 0));
    }

    #[test]
    fn tomorrow_with_explicit_time() {
        let now = fixed_now();
        let dt = resolve_datetime("tomorrow at 9am", now).unwrap();
        assert_eq!(dt.date_naive(), now.date_naive().succ_opt().unwrap());
        assert_eq!((dt.hour(), dt.minute()), (9, 0));

        let dt = resolve_datetime("tomorrow at 2:45 pm", now).unwrap();
        assert_eq!((dt.hour(), dt.minute()), (14, 45));
    }

    #[test]
    fn tomorrow_dayparts() {
        let now = fixed_now();
        assert_eq!(
            resolve_datetime("tomorrow morning", now).unwrap().hour(),
            9
        );
        assert_eq!(
            resolve_datetime("tomorrow afternoon", now).unwrap().hour(),
            14
        );
        assert_eq!(
            resolve_datetime("tomorrow evening", now).unwrap().hour(),
            19
        );
        assert_eq!(resolve_datetime("tomorrow night", now).unwrap().hour(), 19);
    }

    #[test]
    fn tonight_defaults_to_eight() {
        let now = fixed_now();
        let dt = resolve_datetime("tonight", now).unwrap();
        assert_eq!(dt.date_naive(), now.date_naive());
        assert_eq!((dt.hour(), dt.minute()), (20, 0));
    }

    #[test]
    fn today_with_time() {
        let now = fixed_now();
        let dt = resolve_datetime("today at 5pm", now).unwrap();
        assert_eq!(dt.date_naive(), now.date_naive());
        assert_eq!((dt.hour(), dt.minute()), (17, 0));
    }

    #[test]
    fn bare_time_in_future_stays_today() {
        let now = fixed_now(); // 10:30
        let dt = resolve_datetime("at 11am", now).unwrap();
        assert_eq!(dt.date_naive(), now.date_naive());
        assert_eq!(dt.hour(), 11);
    }

    #[test]
    fn bare_time_in_past_rolls_to_tomorrow() {
        let now = fixed_now(); // 10:30
        let dt = resolve_datetime("at 9am", now).unwrap();
        assert_eq!(dt.date_naive(), now.date_naive().succ_opt().unwrap());
        assert_eq!(dt.hour(), 9);
    }

    #[test]
    fn noon_and_midnight() {
        let now = fixed_now();
        let dt = resolve_datetime("tomorrow at 12pm", now).unwrap();
        assert_eq!(dt.hour(), 12);
        let dt = resolve_datetime("tomorrow at 12am", now).unwrap();
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn later_is_one_hour_out() {
        let now = fixed_now();
        let dt = resolve_datetime("later", now).unwrap();
        assert_eq!(dt - now, chrono::Duration::hours(1));
    }

    #[test]
    fn unrecognized_is_none() {
        assert!(resolve_datetime("whenever you feel like it", fixed_now()).is_none());
        assert!(resolve_datetime("", fixed_now()).is_none());
    }

    #[test]
    fn durations() {
        assert_eq!(
            resolve_duration(10, "minutes"),
            Some(Duration::from_secs(600))
        );
        assert_eq!(resolve_duration(45, "secs"), Some(Duration::from_secs(45)));
        assert_eq!(
            resolve_duration(2, "hours"),
            Some(Duration::from_secs(7200))
        );
        assert_eq!(resolve_duration(5, "parsecs"), None);
    }
}
