//! Natural-language intent classification for Vesper.
//!
//! An ordered table of `(intent kind, patterns, extractor)` entries is
//! scanned in fixed priority order; the first matching pattern wins. The
//! table is data-only — adding an intent kind never touches the matching or
//! ranking logic. A dedicated time-expression sub-parser resolves free-text
//! phrases like "tomorrow at 9am" into absolute local timestamps.

pub mod classifier;
pub mod time;

pub use classifier::IntentClassifier;
pub use time::{resolve_datetime, resolve_duration};
