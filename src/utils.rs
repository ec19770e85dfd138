//! Small helpers shared by the listing pipeline and the site build.
//!
//! Nothing here knows about pages or controls: dates, query strings, slugs,
//! text trimming, and a timestamp-driven [`Debouncer`].

use crate::record::ContentRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

// ============================================================================
// Debounce
// ============================================================================

/// Trailing-edge debounce driven by explicit timestamps.
///
/// Each [`schedule`](Self::schedule) pushes the deadline out by `wait`; the
/// owner polls [`fire`](Self::fire) from its event loop and acts once the
/// deadline has passed. Only the last call in a burst fires.
#[derive(Debug, Clone)]
pub struct Debouncer {
    wait: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            deadline: None,
        }
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.wait);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true exactly once per burst, when `now` reaches the deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

// ============================================================================
// Dates
// ============================================================================

/// Parse the date shapes content authors write.
///
/// Accepts `YYYY-MM-DD` (midnight), RFC 3339 timestamps (normalized to UTC),
/// and naive `YYYY-MM-DDTHH:MM[:SS]`.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Long-form display date, e.g. `January 5, 2024`.
///
/// Unparseable input is returned unchanged.
pub fn format_date(s: &str) -> String {
    match parse_date(s) {
        Some(dt) => dt.format("%B %-d, %Y").to_string(),
        None => s.to_string(),
    }
}

// ============================================================================
// URL query strings
// ============================================================================

/// Decode a query string (with or without the leading `?`) into ordered pairs.
/// Repeated keys are kept in order.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Encode pairs as an `application/x-www-form-urlencoded` query string.
pub fn build_query<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

// ============================================================================
// Collections and text
// ============================================================================

/// Sorted distinct non-empty values of `field` across `records`.
/// List-valued fields are flattened.
pub fn unique_values(records: &[ContentRecord], field: &str) -> Vec<String> {
    let values: BTreeSet<String> = records
        .iter()
        .filter_map(|r| r.field(field))
        .flat_map(|v| {
            v.values()
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|v| !v.is_empty())
        .collect();
    values.into_iter().collect()
}

/// URL slug from a title: lowercase, punctuation dropped, runs of
/// whitespace/underscore/dash collapsed to one dash, no edge dashes.
///
/// - `"Skyward: Redux"` → `"skyward-redux"`
/// - `"  Hello__World  "` → `"hello-world"`
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '_' || c == '-' {
            pending_dash = true;
        }
    }
    slug
}

/// Shorten `text` to at most `max` characters, ending in `suffix` when cut.
pub fn truncate_text(text: &str, max: usize, suffix: &str) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(suffix.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(suffix);
    out
}

/// Estimated reading time in whole minutes, never less than one.
pub fn read_time_minutes(text: &str, words_per_minute: usize) -> usize {
    let words = text.split_whitespace().count();
    words.div_ceil(words_per_minute.max(1)).max(1)
}
