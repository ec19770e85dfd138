//! Content records shared by the listing pipeline and the site build.
//!
//! A [`ContentRecord`] is the superset shape of every listing item: a game,
//! a blog post, a team member, or an award. Not every field applies to every
//! kind of item, and fields the pipeline does not know about are preserved
//! verbatim in [`ContentRecord::extra`] so they survive a round trip through
//! the generated `data/*.json` files.
//!
//! Facet fields (`status`, `genre`, `platform`, `role`, `competition`) may be
//! stored either as a single string or as a list of strings; [`FieldValue`]
//! captures both without losing which one the author wrote.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A field that may be written as a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Every element of the value; a single string yields one element.
    pub fn values(&self) -> Vec<&str> {
        match self {
            FieldValue::Text(s) => vec![s.as_str()],
            FieldValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// Comma-joined form, used for list comparisons and display.
    pub fn joined(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(","),
        }
    }

    /// True when the value carries no non-blank text.
    pub fn is_empty(&self) -> bool {
        self.values().iter().all(|v| v.trim().is_empty())
    }

    /// Containment semantics: a list contains an element equal to `needle`,
    /// a string contains `needle` as a substring.
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            FieldValue::Text(s) => s.contains(needle),
            FieldValue::List(items) => items.iter().any(|v| v == needle),
        }
    }

    /// Strict equality against a filter value. Lists compare by their
    /// comma-joined form, so only a single-element list can match.
    pub fn equals(&self, other: &str) -> bool {
        match self {
            FieldValue::Text(s) => s == other,
            FieldValue::List(_) => self.joined() == other,
        }
    }

    fn from_json(value: &Value) -> Option<FieldValue> {
        match value {
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            Value::Number(n) => Some(FieldValue::Text(n.to_string())),
            Value::Bool(b) => Some(FieldValue::Text(b.to_string())),
            Value::Array(items) => Some(FieldValue::List(
                items
                    .iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s.clone()),
                        Value::Null => None,
                        other => Some(other.to_string()),
                    })
                    .collect(),
            )),
            Value::Null | Value::Object(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(items: Vec<&str>) -> Self {
        FieldValue::List(items.into_iter().map(str::to_string).collect())
    }
}

/// One listing item.
///
/// JSON keys use camelCase (`releaseDate`, `coverImage`, `detailPath`) to
/// match the content files and the data files the site's pages fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    /// Display name or headline. Required; team files may call it `name`.
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition: Option<FieldValue>,
    /// Award placement; authors write it as a number or a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Every other key of the source object, kept as written.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ContentRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Look up a field by its JSON name.
    ///
    /// Known fields are read from their typed slots; anything else falls back
    /// to [`extra`](Self::extra). Absent, null and empty-list fields yield
    /// `None`, so callers never have to distinguish "missing" from "blank".
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        let text = |v: &Option<String>| v.as_deref().map(FieldValue::from);
        match name {
            "title" => Some(FieldValue::Text(self.title.clone())),
            "description" => text(&self.description),
            "excerpt" => text(&self.excerpt),
            "bio" => text(&self.bio),
            "date" => text(&self.date),
            "releaseDate" => text(&self.release_date),
            "thumbnail" => text(&self.thumbnail),
            "coverImage" => text(&self.cover_image),
            "detailPath" => text(&self.detail_path),
            "slug" => text(&self.slug),
            "tags" if self.tags.is_empty() => None,
            "tags" => Some(FieldValue::List(self.tags.clone())),
            "status" => self.status.clone(),
            "genre" => self.genre.clone(),
            "platform" => self.platform.clone(),
            "role" => self.role.clone(),
            "competition" => self.competition.clone(),
            "rank" => self.rank.as_ref().and_then(FieldValue::from_json),
            other => self.extra.get(other).and_then(FieldValue::from_json),
        }
    }

    /// The record's date for sorting and range filters: `date`, else `releaseDate`.
    pub fn effective_date(&self) -> Option<&str> {
        self.date.as_deref().or(self.release_date.as_deref())
    }

    /// Card summary text: the first of description, excerpt, bio.
    pub fn summary(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or(self.excerpt.as_deref())
            .or(self.bio.as_deref())
    }

    /// Card image: thumbnail, cover image, then a team member's `photo`
    /// or `imageUrl`.
    pub fn image(&self) -> Option<&str> {
        self.thumbnail
            .as_deref()
            .or(self.cover_image.as_deref())
            .or_else(|| {
                ["photo", "imageUrl"]
                    .iter()
                    .find_map(|key| self.extra.get(*key).and_then(Value::as_str))
            })
            .filter(|src| !src.is_empty())
    }

    /// Rank as display text; numbers render without quotes.
    pub fn rank_text(&self) -> Option<String> {
        match self.rank.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
