//! Shared test utilities for the atlas-site test suite.
//!
//! Record builders, page fixtures and filesystem helpers used across the
//! listing, search, content and generate tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let records = vec![game("Skyward", "released", "2024-03-01", &["co-op"])];
//! let mut doc = listing_page("?status=released");
//! assert_eq!(titles(&records), vec!["Skyward"]);
//!
//! let tmp = setup_site();
//! let content = load_content(tmp.path()).unwrap();
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::document::Document;
use crate::record::ContentRecord;

// =========================================================================
// Records and pages
// =========================================================================

/// A game record with `status`, `date` and `tags` set.
pub fn game(title: &str, status: &str, date: &str, tags: &[&str]) -> ContentRecord {
    let mut record = ContentRecord::new(title);
    record.status = Some(status.into());
    record.date = Some(date.to_string());
    record.tags = tags.iter().map(|t| t.to_string()).collect();
    record
}

/// All titles in order.
pub fn titles(records: &[ContentRecord]) -> Vec<&str> {
    records.iter().map(|r| r.title.as_str()).collect()
}

/// A listing page with the three default containers, opened at `query`.
pub fn listing_page(query: &str) -> Document {
    let mut doc = Document::with_containers(["#listing", "#filters", "#results-count"]);
    doc.set_query(query);
    doc
}

// =========================================================================
// Filesystem
// =========================================================================

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}
