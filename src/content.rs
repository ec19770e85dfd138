//! Content directory loading.
//!
//! Reads the studio's authored content into [`SiteContent`]. JSON
//! collections hold one record per file; blog posts are Markdown with an
//! optional front matter block.
//!
//! ## Directory layout
//!
//! ```text
//! content/
//! ├── games/            # one JSON object per game
//! │   ├── skyward.json
//! │   └── deep-signal.json
//! ├── team/             # one JSON object per member
//! ├── awards/           # one JSON object per award
//! └── blog/
//!     └── devlog-1.md   # front matter + Markdown body; slug = file stem
//! ```
//!
//! ## Front matter
//!
//! ```text
//! ---
//! title: "Devlog #1"
//! date: 2024-02-01
//! tags: devlog, art
//! author: Rin
//! ---
//! Body in Markdown...
//! ```
//!
//! One `key: value` per line; surrounding quotes are stripped and `tags` is
//! a comma-separated list. Keys other than the known ones are kept on the
//! record as extra fields.
//!
//! A file that cannot be read or parsed is skipped with a warning and
//! listed in [`SiteContent::skipped`]; it never fails the whole load.

use crate::record::ContentRecord;
use crate::utils::{parse_date, read_time_minutes, slugify, truncate_text};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const WORDS_PER_MINUTE: usize = 200;
const EXCERPT_LENGTH: usize = 160;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("failed to list {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ============================================================================
// Collections
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Games,
    Blog,
    Team,
    Awards,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Games,
        Collection::Blog,
        Collection::Team,
        Collection::Awards,
    ];

    /// Name used for the content directory and `data/<name>.json`.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Games => "games",
            Collection::Blog => "blog",
            Collection::Team => "team",
            Collection::Awards => "awards",
        }
    }

    /// Output directory for per-record pages, if the collection has them.
    pub fn detail_dir(self) -> Option<&'static str> {
        match self {
            Collection::Games => Some("game"),
            Collection::Blog => Some("blog"),
            Collection::Team => Some("team"),
            Collection::Awards => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Collection> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Loaded content
// ============================================================================

/// A blog post: its listing record plus the Markdown body.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub record: ContentRecord,
    pub body: String,
}

/// A file left out of the load, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct SiteContent {
    pub games: Vec<ContentRecord>,
    pub posts: Vec<Post>,
    pub team: Vec<ContentRecord>,
    pub awards: Vec<ContentRecord>,
    pub skipped: Vec<Skipped>,
}

impl SiteContent {
    /// The listing records of one collection.
    pub fn collection(&self, collection: Collection) -> Vec<ContentRecord> {
        match collection {
            Collection::Games => self.games.clone(),
            Collection::Blog => self.posts.iter().map(|p| p.record.clone()).collect(),
            Collection::Team => self.team.clone(),
            Collection::Awards => self.awards.clone(),
        }
    }

    pub fn count(&self, collection: Collection) -> usize {
        match collection {
            Collection::Games => self.games.len(),
            Collection::Blog => self.posts.len(),
            Collection::Team => self.team.len(),
            Collection::Awards => self.awards.len(),
        }
    }
}

/// Load everything under `<root>/content`. Missing collection directories
/// are simply empty.
pub fn load_content(root: &Path) -> Result<SiteContent, ContentError> {
    let content_dir = root.join("content");
    let mut content = SiteContent::default();

    content.games = load_records(&content_dir, Collection::Games, &mut content.skipped)?;
    content.team = load_records(&content_dir, Collection::Team, &mut content.skipped)?;
    content.awards = load_records(&content_dir, Collection::Awards, &mut content.skipped)?;
    content.posts = load_posts(&content_dir.join("blog"), &mut content.skipped)?;

    sort_newest_first(&mut content.games, |r| r.release_date.as_deref());
    content
        .posts
        .sort_by(|a, b| newest_first(a.record.date.as_deref(), b.record.date.as_deref()));

    debug!(
        games = content.games.len(),
        posts = content.posts.len(),
        team = content.team.len(),
        awards = content.awards.len(),
        skipped = content.skipped.len(),
        "content loaded"
    );
    Ok(content)
}

/// Files in `dir` with extension `ext`, sorted by name.
fn list_files(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, ContentError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir).map_err(|source| ContentError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == ext))
        .collect();
    files.sort();
    Ok(files)
}

fn load_records(
    content_dir: &Path,
    collection: Collection,
    skipped: &mut Vec<Skipped>,
) -> Result<Vec<ContentRecord>, ContentError> {
    let mut records = Vec::new();
    for path in list_files(&content_dir.join(collection.name()), "json")? {
        match read_record(&path) {
            Ok(mut record) => {
                assign_paths(&mut record, collection, None);
                records.push(record);
            }
            Err(reason) => skip(skipped, path, reason),
        }
    }
    Ok(records)
}

fn read_record(path: &Path) -> Result<ContentRecord, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

fn load_posts(dir: &Path, skipped: &mut Vec<Skipped>) -> Result<Vec<Post>, ContentError> {
    let mut posts = Vec::new();
    for path in list_files(dir, "md")? {
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                skip(skipped, path, e.to_string());
                continue;
            }
        };
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        posts.push(parse_post(&stem, &text));
    }
    Ok(posts)
}

fn skip(skipped: &mut Vec<Skipped>, path: PathBuf, reason: String) {
    warn!(path = %path.display(), %reason, "skipping content file");
    skipped.push(Skipped { path, reason });
}

// ============================================================================
// Posts and front matter
// ============================================================================

/// Split a leading `---` block off `text`.
///
/// Returns the parsed fields and the remaining body. Text without a closed
/// front matter block yields no fields and the whole text as body.
pub fn parse_front_matter(text: &str) -> (BTreeMap<String, String>, &str) {
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return (BTreeMap::new(), text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let fields = parse_fields(&rest[..offset]);
            return (fields, &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (BTreeMap::new(), text)
}

fn parse_fields(block: &str) -> BTreeMap<String, String> {
    block
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Build a post from its file stem and source text.
///
/// Title falls back to the first `# ` heading, then the slug. Excerpt falls
/// back to the start of the first paragraph.
pub fn parse_post(slug: &str, text: &str) -> Post {
    let (mut fields, body) = parse_front_matter(text);

    let title = fields
        .remove("title")
        .filter(|t| !t.is_empty())
        .or_else(|| first_heading(body))
        .unwrap_or_else(|| slug.to_string());

    let mut record = ContentRecord::new(title);
    record.date = fields.remove("date").filter(|d| !d.is_empty());
    record.excerpt = fields
        .remove("excerpt")
        .filter(|e| !e.is_empty())
        .or_else(|| first_paragraph(body).map(|p| truncate_text(&p, EXCERPT_LENGTH, "...")));
    record.tags = fields
        .remove("tags")
        .map(|t| {
            t.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    record.cover_image = fields
        .remove("coverImage")
        .or_else(|| fields.remove("image"))
        .filter(|i| !i.is_empty());
    record.extra.insert(
        "readTime".into(),
        Value::from(read_time_minutes(body, WORDS_PER_MINUTE)),
    );
    for (key, value) in fields {
        record.extra.insert(key, Value::String(value));
    }
    assign_paths(&mut record, Collection::Blog, Some(slug));

    Post {
        record,
        body: body.to_string(),
    }
}

fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn first_paragraph(body: &str) -> Option<String> {
    let paragraph: Vec<&str> = body
        .lines()
        .map(str::trim)
        .skip_while(|l| l.is_empty() || l.starts_with('#'))
        .take_while(|l| !l.is_empty())
        .collect();
    (!paragraph.is_empty()).then(|| paragraph.join(" "))
}

// ============================================================================
// Slugs, paths, ordering
// ============================================================================

/// Fill in `slug` and `detailPath` unless the author set them.
fn assign_paths(record: &mut ContentRecord, collection: Collection, slug: Option<&str>) {
    if record.slug.as_deref().is_none_or(str::is_empty) {
        record.slug = Some(slug.map(str::to_string).unwrap_or_else(|| slugify(&record.title)));
    }
    if record.detail_path.is_some() {
        return;
    }
    if let Some(dir) = collection.detail_dir() {
        let slug = record.slug.as_deref().unwrap_or_default();
        record.detail_path = Some(format!("{dir}/{slug}.html"));
    }
}

/// Descending by date; undated and unparseable entries go last.
fn newest_first(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a.and_then(parse_date), b.and_then(parse_date)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sort_newest_first<F>(records: &mut [ContentRecord], date: F)
where
    F: Fn(&ContentRecord) -> Option<&str>,
{
    records.sort_by(|a, b| newest_first(date(a), date(b)));
}

// ============================================================================
// Validation
// ============================================================================

/// A problem found by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub collection: Collection,
    /// Title (or slug, when the title is blank) of the offending record.
    pub record: String,
    pub message: String,
}

/// Check every collection: titles present, dates parse, slugs unique.
pub fn validate(content: &SiteContent) -> Vec<Issue> {
    let mut issues = Vec::new();
    for collection in Collection::ALL {
        let records = content.collection(collection);
        let mut seen = HashSet::new();
        for record in &records {
            let name = if record.title.trim().is_empty() {
                record.slug.clone().unwrap_or_default()
            } else {
                record.title.clone()
            };
            let mut issue = |message: String| {
                issues.push(Issue {
                    collection,
                    record: name.clone(),
                    message,
                })
            };

            if record.title.trim().is_empty() {
                issue("missing title".into());
            }
            for (key, value) in [("date", &record.date), ("releaseDate", &record.release_date)] {
                if let Some(value) = value.as_deref().filter(|v| parse_date(v).is_none()) {
                    issue(format!("{key} {value:?} is not a date"));
                }
            }
            if let Some(slug) = record.slug.as_deref() {
                if !seen.insert(slug.to_string()) {
                    issue(format!("duplicate slug {slug:?}"));
                }
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{titles, write_file};
    use tempfile::TempDir;

    // =========================================================================
    // Front matter
    // =========================================================================

    #[test]
    fn front_matter_fields_and_body() {
        let text = "---\ntitle: \"Devlog #1\"\ndate: 2024-02-01\nurl: https://x.io/a\n---\n# Hi\nBody";
        let (fields, body) = parse_front_matter(text);
        assert_eq!(fields["title"], "Devlog #1");
        assert_eq!(fields["date"], "2024-02-01");
        assert_eq!(fields["url"], "https://x.io/a");
        assert_eq!(body, "# Hi\nBody");
    }

    #[test]
    fn no_front_matter_keeps_whole_text() {
        let (fields, body) = parse_front_matter("# Title\n\ntext");
        assert!(fields.is_empty());
        assert_eq!(body, "# Title\n\ntext");
    }

    #[test]
    fn unclosed_front_matter_is_body() {
        let text = "---\ntitle: x\nno close";
        let (fields, body) = parse_front_matter(text);
        assert!(fields.is_empty());
        assert_eq!(body, text);
    }

    #[test]
    fn single_quotes_stripped() {
        let (fields, _) = parse_front_matter("---\nauthor: 'Rin'\n---\n");
        assert_eq!(fields["author"], "Rin");
    }

    #[test]
    fn mismatched_quotes_kept() {
        let text = "---\ntitle: \"it'\nquote: \"\nnote: 'half\ninner: \"say 'hi'\"\n---\n";
        let (fields, _) = parse_front_matter(text);
        assert_eq!(fields["title"], "\"it'");
        assert_eq!(fields["quote"], "\"");
        assert_eq!(fields["note"], "'half");
        assert_eq!(fields["inner"], "say 'hi'");
    }

    // =========================================================================
    // Posts
    // =========================================================================

    #[test]
    fn post_record_from_front_matter() {
        let text = "---\ntitle: Devlog\ndate: 2024-02-01\ntags: devlog, art ,\nauthor: Rin\n---\nFirst words here.\n";
        let post = parse_post("devlog-1", text);
        let r = &post.record;
        assert_eq!(r.title, "Devlog");
        assert_eq!(r.date.as_deref(), Some("2024-02-01"));
        assert_eq!(r.tags, vec!["devlog", "art"]);
        assert_eq!(r.extra["author"], "Rin");
        assert_eq!(r.extra["readTime"], 1);
        assert_eq!(r.slug.as_deref(), Some("devlog-1"));
        assert_eq!(r.detail_path.as_deref(), Some("blog/devlog-1.html"));
        assert_eq!(r.excerpt.as_deref(), Some("First words here."));
        assert_eq!(post.body, "First words here.\n");
    }

    #[test]
    fn post_title_falls_back_to_heading_then_slug() {
        assert_eq!(parse_post("a", "# From Heading\n\nx").record.title, "From Heading");
        assert_eq!(parse_post("from-slug", "just text").record.title, "from-slug");
    }

    #[test]
    fn post_excerpt_skips_headings_and_truncates() {
        let long = "word ".repeat(60);
        let post = parse_post("a", &format!("# Title\n\n{long}\n\nsecond"));
        let excerpt = post.record.excerpt.unwrap();
        assert!(excerpt.ends_with("..."));
        assert_eq!(excerpt.chars().count(), EXCERPT_LENGTH);
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn loads_collections_and_orders_them() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_file(root, "content/games/a.json", r#"{"title": "Old", "releaseDate": "2022-01-01"}"#);
        write_file(root, "content/games/b.json", r#"{"title": "New", "releaseDate": "2024-01-01"}"#);
        write_file(root, "content/games/c.json", r#"{"title": "Undated"}"#);
        write_file(root, "content/team/2-zed.json", r#"{"title": "Zed", "role": "Artist"}"#);
        write_file(root, "content/team/1-amy.json", r#"{"title": "Amy", "role": "Coder"}"#);
        write_file(root, "content/blog/one.md", "---\ntitle: One\ndate: 2023-01-01\n---\nx");
        write_file(root, "content/blog/two.md", "---\ntitle: Two\ndate: 2024-01-01\n---\ny");
        write_file(root, "content/blog/notes.txt", "ignored");

        let content = load_content(root).unwrap();
        assert_eq!(titles(&content.games), vec!["New", "Old", "Undated"]);
        assert_eq!(titles(&content.team), vec!["Amy", "Zed"]);
        assert_eq!(titles(&content.collection(Collection::Blog)), vec!["Two", "One"]);
        assert!(content.awards.is_empty());
        assert!(content.skipped.is_empty());
    }

    #[test]
    fn invalid_json_is_skipped() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "content/games/good.json", r#"{"title": "Good"}"#);
        write_file(tmp.path(), "content/games/bad.json", "{oops");
        write_file(tmp.path(), "content/games/untitled.json", r#"{"status": "beta"}"#);

        let content = load_content(tmp.path()).unwrap();
        assert_eq!(titles(&content.games), vec!["Good"]);
        assert_eq!(content.skipped.len(), 2);
        assert!(content.skipped[0].path.ends_with("bad.json"));
    }

    #[test]
    fn team_files_may_use_name_and_photo() {
        let tmp = TempDir::new().unwrap();
        write_file(
            tmp.path(),
            "content/team/ada.json",
            r#"{"name": "Ada Park", "role": "Programmer", "bio": "Engine work.", "photo": "assets/img/ada.png"}"#,
        );

        let content = load_content(tmp.path()).unwrap();
        assert!(content.skipped.is_empty());
        assert_eq!(titles(&content.team), vec!["Ada Park"]);
        let ada = &content.team[0];
        assert_eq!(ada.slug.as_deref(), Some("ada-park"));
        assert_eq!(ada.detail_path.as_deref(), Some("team/ada-park.html"));
        assert_eq!(ada.image(), Some("assets/img/ada.png"));
    }

    #[test]
    fn missing_content_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let content = load_content(tmp.path()).unwrap();
        for c in Collection::ALL {
            assert_eq!(content.count(c), 0);
        }
    }

    #[test]
    fn slug_and_detail_path_assigned() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "content/games/x.json", r#"{"title": "Skyward: Redux"}"#);
        write_file(
            tmp.path(),
            "content/games/y.json",
            r#"{"title": "Custom", "slug": "mine", "detailPath": "/custom.html"}"#,
        );
        write_file(tmp.path(), "content/awards/z.json", r#"{"title": "Best Art"}"#);

        let content = load_content(tmp.path()).unwrap();
        let sky = content.games.iter().find(|g| g.title == "Skyward: Redux").unwrap();
        assert_eq!(sky.slug.as_deref(), Some("skyward-redux"));
        assert_eq!(sky.detail_path.as_deref(), Some("game/skyward-redux.html"));

        let custom = content.games.iter().find(|g| g.title == "Custom").unwrap();
        assert_eq!(custom.slug.as_deref(), Some("mine"));
        assert_eq!(custom.detail_path.as_deref(), Some("/custom.html"));

        assert_eq!(content.awards[0].detail_path, None);
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_reports_titles_dates_and_duplicate_slugs() {
        let mut blank = ContentRecord::new("  ");
        blank.slug = Some("blank".into());
        let mut bad_date = ContentRecord::new("Late");
        bad_date.release_date = Some("someday".into());
        bad_date.slug = Some("late".into());
        let mut dup = ContentRecord::new("Late Again");
        dup.slug = Some("late".into());

        let content = SiteContent {
            games: vec![blank, bad_date, dup],
            ..Default::default()
        };
        let issues = validate(&content);
        let messages: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "missing title",
                r#"releaseDate "someday" is not a date"#,
                r#"duplicate slug "late""#,
            ]
        );
        assert_eq!(issues[0].record, "blank");
        assert!(issues.iter().all(|i| i.collection == Collection::Games));
    }

    #[test]
    fn same_slug_in_different_collections_is_fine() {
        let mut game = ContentRecord::new("Rin");
        game.slug = Some("rin".into());
        let member = game.clone();
        let content = SiteContent {
            games: vec![game],
            team: vec![member],
            ..Default::default()
        };
        assert!(validate(&content).is_empty());
    }

    #[test]
    fn collection_names_round_trip() {
        for c in Collection::ALL {
            assert_eq!(Collection::from_name(c.name()), Some(c));
        }
        assert_eq!(Collection::from_name("art"), None);
    }
}
