//! CLI output formatting for every command.
//!
//! Output is information-first: each entity leads with a positional index
//! and its title, with file paths as indented context lines.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Pages
//! 001 blog.html (listing: blog, 1 item, 1 page)
//! 002 games.html (listing: games, 2 items, 1 page)
//! 003 index.html
//!
//! Detail pages
//!     games: 2 → game/
//!     blog: 1 → blog/
//!     team: 1 → team/
//!
//! Generated 3 pages, 4 detail pages, 11 sitemap URLs → dist
//! ```
//!
//! ## Check
//!
//! ```text
//! Content
//!     games: 2
//!     blog: 1
//!
//! Issues
//!     games "X": releaseDate "soon" is not a date
//!
//! 1 problem found
//! ```
//!
//! ## Query
//!
//! ```text
//! games: 1 of 2 match (page 1 of 1)
//! Filters: status=released
//! 001 Skyward [released] March 1, 2024
//!     game/skyward.html
//! Showing 1-1 of 1 results
//! ```
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::content::{Collection, Skipped};
use crate::generate::{BuildReport, CheckReport};
use crate::listing::{ListingSnapshot, results_count_text};
use crate::utils::{format_date, truncate_text};

const DESCRIPTION_WIDTH: usize = 60;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// "1 item", "2 items".
fn plural(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

fn skipped_lines(skipped: &[Skipped], lines: &mut Vec<String>) {
    if skipped.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push("Skipped".to_string());
    for s in skipped {
        lines.push(format!("{}{}: {}", indent(1), s.path.display(), s.reason));
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];
    for (i, page) in report.pages.iter().enumerate() {
        let line = match &page.listing {
            Some(listing) => format!(
                "{} {} (listing: {}, {}, {})",
                format_index(i + 1),
                page.name,
                listing.collection,
                plural(listing.items, "item", "items"),
                plural(listing.pages, "page", "pages"),
            ),
            None => format!("{} {}", format_index(i + 1), page.name),
        };
        lines.push(line);
    }

    lines.push(String::new());
    lines.push("Detail pages".to_string());
    for (collection, count) in &report.detail_pages {
        let dir = collection.detail_dir().unwrap_or_default();
        lines.push(format!("{}{collection}: {count} → {dir}/", indent(1)));
    }

    if !report.root_files.is_empty() {
        lines.push(String::new());
        lines.push("Root files".to_string());
        for name in &report.root_files {
            lines.push(format!("{}{name}", indent(1)));
        }
    }

    skipped_lines(&report.skipped, &mut lines);

    let detail_total: usize = report.detail_pages.iter().map(|(_, n)| n).sum();
    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}, {} → {}",
        plural(report.pages.len(), "page", "pages"),
        plural(detail_total, "detail page", "detail pages"),
        plural(report.sitemap_urls, "sitemap URL", "sitemap URLs"),
        report.output_dir.display(),
    ));
    lines
}

pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let mut lines = vec!["Content".to_string()];
    for (collection, count) in &report.counts {
        lines.push(format!("{}{collection}: {count}", indent(1)));
    }

    if !report.issues.is_empty() {
        lines.push(String::new());
        lines.push("Issues".to_string());
        for issue in &report.issues {
            lines.push(format!(
                "{}{} {:?}: {}",
                indent(1),
                issue.collection,
                issue.record,
                issue.message
            ));
        }
    }

    skipped_lines(&report.skipped, &mut lines);

    let page_sections = [
        ("Missing listing pages", &report.missing_pages),
        ("Listing pages without {{listing}}", &report.unused_listings),
    ];
    for (heading, pages) in page_sections {
        if pages.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(heading.to_string());
        for page in pages {
            lines.push(format!("{}{page}", indent(1)));
        }
    }

    let problems = report.issues.len()
        + report.skipped.len()
        + report.missing_pages.len()
        + report.unused_listings.len();
    lines.push(String::new());
    if problems == 0 {
        lines.push("OK".to_string());
    } else {
        lines.push(format!("{} found", plural(problems, "problem", "problems")));
    }
    lines
}

pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Query
// ============================================================================

/// One listing page as the site would show it, in plain text.
pub fn format_query_output(collection: Collection, snap: &ListingSnapshot) -> Vec<String> {
    let mut lines = vec![format!(
        "{collection}: {} of {} match (page {} of {})",
        snap.matched,
        snap.total,
        snap.page,
        snap.total_pages.max(1),
    )];
    let filters = snap.filters.to_query_string();
    lines.push(format!(
        "Filters: {}",
        if filters.is_empty() { "none" } else { filters.as_str() }
    ));

    let offset = (snap.page.max(1) - 1) * snap.items_per_page;
    for (i, item) in snap.items.iter().enumerate() {
        let mut header = format!("{} {}", format_index(offset + i + 1), item.title);
        if let Some(status) = item.status.as_ref().filter(|s| !s.is_empty()) {
            header.push_str(&format!(" [{}]", status.joined()));
        }
        if let Some(date) = item.effective_date() {
            header.push(' ');
            header.push_str(&format_date(date));
        }
        lines.push(header);
        if let Some(path) = &item.detail_path {
            lines.push(format!("{}{path}", indent(1)));
        }
        if let Some(summary) = item.summary() {
            lines.push(format!(
                "{}{}",
                indent(1),
                truncate_text(summary, DESCRIPTION_WIDTH, "...")
            ));
        }
    }

    lines.push(results_count_text(
        snap.matched,
        snap.page,
        snap.items_per_page,
    ));
    lines
}

pub fn print_query_output(collection: Collection, snap: &ListingSnapshot) {
    for line in format_query_output(collection, snap) {
        println!("{}", line);
    }
}
