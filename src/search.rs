//! Text search, facet filtering, and sorting over a fixed record collection.
//!
//! [`Search`] holds the original collection and never mutates it: every
//! query starts again from the full set and returns a fresh `Vec`. This is
//! what makes filter changes order-independent; the previous view is never
//! an input to the next one.
//!
//! ## Advanced search stages
//!
//! [`Search::advanced_search`] applies each active constraint in turn, each
//! stage narrowing the output of the one before:
//!
//! ```text
//! text query → tags (all selected) → facets → date range
//! ```
//!
//! Facets are driven by [`FACETS`]: status, genre, role, and competition
//! compare by exact, case-sensitive equality; platform matches by
//! containment. A facet whose value is the `"all"` sentinel (or blank) is
//! skipped, see [`is_active_filter_value`].

use crate::filters::{FACETS, FacetMatch, FilterState, SortOrder, is_active_filter_value};
use crate::record::{ContentRecord, FieldValue};
use crate::utils::{parse_date, unique_values};
use chrono::NaiveDateTime;
use maud::{Markup, html};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

/// Fields searched when the caller names none.
pub const DEFAULT_SEARCH_FIELDS: &[&str] = &["title"];

/// Distinct values observed per facet. A facet no record uses is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitions: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct Search {
    original: Vec<ContentRecord>,
    fields: Vec<String>,
}

impl Search {
    pub fn new<I, S>(records: Vec<ContentRecord>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            fields = DEFAULT_SEARCH_FIELDS.iter().map(|f| f.to_string()).collect();
        }
        Self {
            original: records,
            fields,
        }
    }

    /// The unfiltered collection.
    pub fn records(&self) -> &[ContentRecord] {
        &self.original
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Replace the collection, e.g. after a refresh.
    pub fn update_data(&mut self, records: Vec<ContentRecord>) {
        self.original = records;
    }

    /// Case-insensitive substring search over the configured fields.
    ///
    /// A blank query returns the whole original collection. List fields
    /// match when any element contains the query.
    pub fn search(&self, query: &str) -> Vec<ContentRecord> {
        let term = query.trim().to_lowercase();
        if term.is_empty() {
            return self.original.clone();
        }
        self.original
            .iter()
            .filter(|r| self.matches_text(r, &term))
            .cloned()
            .collect()
    }

    fn matches_text(&self, record: &ContentRecord, term: &str) -> bool {
        self.fields.iter().any(|field| {
            record.field(field).is_some_and(|value| {
                value
                    .values()
                    .iter()
                    .any(|v| v.to_lowercase().contains(term))
            })
        })
    }

    /// Apply every active constraint of `criteria`, conjunctively.
    ///
    /// Sorting is not part of this; see [`Search::sort`].
    pub fn advanced_search(&self, criteria: &FilterState) -> Vec<ContentRecord> {
        let mut results = match criteria.query.as_deref() {
            Some(q) if !q.is_empty() => self.search(q),
            _ => self.original.clone(),
        };

        if !criteria.tags.is_empty() {
            results.retain(|r| criteria.tags.iter().all(|tag| r.tags.contains(tag)));
        }

        for descriptor in FACETS {
            let Some(wanted) = criteria
                .facet(descriptor.facet)
                .filter(|v| is_active_filter_value(Some(v)))
            else {
                continue;
            };
            results.retain(|r| match (descriptor.value)(r) {
                Some(value) => match descriptor.matching {
                    FacetMatch::Exact => value.equals(wanted),
                    FacetMatch::Contains => value.contains(wanted),
                },
                None => false,
            });
        }

        let from = criteria.date_from.as_deref().filter(|s| !s.trim().is_empty());
        let to = criteria.date_to.as_deref().filter(|s| !s.trim().is_empty());
        if from.is_some() || to.is_some() {
            let from = from.and_then(parse_date);
            let to = to.and_then(parse_date);
            results.retain(|r| {
                let Some(date) = r.effective_date().and_then(parse_date) else {
                    return false;
                };
                from.is_none_or(|f| date >= f) && to.is_none_or(|t| date <= t)
            });
        }

        results
    }

    /// Stable sort of `records` by `key`, returning a new vector.
    ///
    /// - `date` compares `date`, falling back to `releaseDate`; `releaseDate`
    ///   compares only itself. Both parse as dates; undated records sort first
    ///   in ascending order.
    /// - numeric JSON values compare numerically.
    /// - everything else compares as lower-cased text, lists by their
    ///   comma-joined form; missing values compare as empty text.
    ///
    /// `Desc` reverses the comparator, so ties keep their input order either way.
    pub fn sort(records: &[ContentRecord], key: &str, order: SortOrder) -> Vec<ContentRecord> {
        let mut keyed: Vec<(SortKey, &ContentRecord)> = records
            .iter()
            .map(|r| (SortKey::of(r, key), r))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| {
            let ord = a.compare(b);
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        keyed.into_iter().map(|(_, r)| r.clone()).collect()
    }

    /// Sorted distinct non-empty values per facet across the collection.
    pub fn filter_options(&self) -> FilterOptions {
        let collect = |field: &str| {
            let values = unique_values(&self.original, field);
            (!values.is_empty()).then_some(values)
        };
        FilterOptions {
            tags: collect("tags"),
            genres: collect("genre"),
            platforms: collect("platform"),
            statuses: collect("status"),
            roles: collect("role"),
            competitions: collect("competition"),
        }
    }

    /// Completion candidates for a partially typed query.
    ///
    /// List entries that contain the partial query are offered whole; text
    /// fields that contain it contribute their words that start with it.
    /// Queries shorter than two characters produce nothing. Results are
    /// distinct, in first-seen order, at most `limit` long.
    pub fn suggestions(&self, partial: &str, limit: usize) -> Vec<String> {
        if partial.chars().count() < 2 {
            return Vec::new();
        }
        let query = partial.to_lowercase();
        let mut found: Vec<String> = Vec::new();
        let mut add = |candidate: &str| {
            if !candidate.is_empty() && !found.iter().any(|f| f == candidate) {
                found.push(candidate.to_string());
            }
        };

        for record in &self.original {
            for field in &self.fields {
                match record.field(field) {
                    Some(FieldValue::List(items)) => {
                        for item in items.iter().filter(|i| i.to_lowercase().contains(&query)) {
                            add(item);
                        }
                    }
                    Some(FieldValue::Text(text)) if text.to_lowercase().contains(&query) => {
                        for word in text
                            .split_whitespace()
                            .filter(|w| w.to_lowercase().starts_with(&query))
                        {
                            add(word);
                        }
                    }
                    _ => {}
                }
            }
        }

        found.truncate(limit);
        found
    }
}

/// Wrap case-insensitive occurrences of `term` in `<mark>`.
///
/// Text is escaped like any other Maud interpolation; a blank term returns
/// the text unmarked.
pub fn highlight(text: &str, term: &str) -> Markup {
    let needle: Vec<char> = term.trim().chars().collect();
    let mut segments: Vec<(bool, &str)> = Vec::new();

    if needle.is_empty() {
        segments.push((false, text));
    } else {
        let mut plain_start = 0;
        let mut pos = 0;
        while pos < text.len() {
            if let Some(len) = match_len_at(&text[pos..], &needle) {
                if plain_start < pos {
                    segments.push((false, &text[plain_start..pos]));
                }
                segments.push((true, &text[pos..pos + len]));
                pos += len;
                plain_start = pos;
            } else {
                pos += text[pos..].chars().next().map_or(1, char::len_utf8);
            }
        }
        if plain_start < text.len() {
            segments.push((false, &text[plain_start..]));
        }
    }

    html! {
        @for (hit, segment) in segments {
            @if hit { mark { (segment) } } @else { (segment) }
        }
    }
}

/// Byte length of a case-insensitive match of `needle` at the start of `hay`.
fn match_len_at(hay: &str, needle: &[char]) -> Option<usize> {
    let mut chars = hay.char_indices();
    for expected in needle {
        let (_, c) = chars.next()?;
        if !c.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    Some(chars.next().map_or(hay.len(), |(i, _)| i))
}

enum SortKey {
    Date(Option<NaiveDateTime>),
    Number(f64),
    Text(String),
}

impl SortKey {
    fn of(record: &ContentRecord, key: &str) -> SortKey {
        match key {
            "date" => SortKey::Date(record.effective_date().and_then(parse_date)),
            "releaseDate" => SortKey::Date(record.release_date.as_deref().and_then(parse_date)),
            _ => {
                let raw = match key {
                    "rank" => record.rank.as_ref(),
                    other => record.extra.get(other),
                };
                if let Some(n) = raw.and_then(Value::as_f64) {
                    return SortKey::Number(n);
                }
                SortKey::Text(
                    record
                        .field(key)
                        .map(|v| v.joined().to_lowercase())
                        .unwrap_or_default(),
                )
            }
        }
    }

    fn variant_rank(&self) -> u8 {
        match self {
            SortKey::Date(_) => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
        }
    }

    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.variant_rank().cmp(&other.variant_rank()),
        }
    }
}
