//! Static site generation.
//!
//! Turns a project directory (root HTML pages, `assets/`, `content/`,
//! optional `site.toml`) into a deployable `dist/`.
//!
//! ## Build steps
//!
//! 1. Clean the output directory
//! 2. Copy `assets/` recursively and the configured root files
//! 3. Run every root `*.html` page through `{{placeholder}}` substitution;
//!    pages configured as listings get their first page pre-rendered
//! 4. Render detail pages for games, posts, and team members (in parallel)
//! 5. Write `data/<collection>.json` for the listing pages to fetch
//! 6. Write `sitemap.xml`
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── games.html              # {{listing}} etc. pre-rendered
//! ├── robots.txt
//! ├── assets/...
//! ├── game/skyward.html       # one page per game
//! ├── blog/devlog-1.html      # Markdown rendered to HTML
//! ├── team/rin.html
//! ├── data/
//! │   ├── games.json
//! │   ├── blog.json
//! │   ├── team.json
//! │   └── awards.json
//! └── sitemap.xml
//! ```
//!
//! ## Page placeholders
//!
//! | Placeholder         | Value                                          |
//! |---------------------|------------------------------------------------|
//! | `{{site_name}}`     | `site_name` from config                        |
//! | `{{site_url}}`      | `site_url` from config                         |
//! | `{{year}}`          | current year                                   |
//! | `{{listing}}`       | first page of cards (listing pages only)       |
//! | `{{filters}}`       | filter controls (listing pages only)           |
//! | `{{results_count}}` | "Showing 1-12 of 40 results" (listing pages)   |
//! | `{{listing_data}}`  | `data/<collection>.json` (listing pages)       |
//!
//! Detail pages are rendered with [maud](https://maud.lambda.xyz/); their
//! markup is type-checked Rust with automatic escaping.

use crate::config::{ListingPage, SiteConfig};
use crate::content::{
    Collection, ContentError, Issue, Post, SiteContent, Skipped, load_content, validate,
};
use crate::listing::{ListingConfig, snapshot};
use crate::record::ContentRecord;
use crate::template::{TemplateData, placeholders, render_template};
use crate::utils::format_date;
use chrono::{Datelike, Local};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Options, Parser, html as md_html};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

const STYLESHEET: &str = "assets/css/style.css";
const RELATED_GAMES: usize = 3;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to walk {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("output directory {0} would overwrite the project; choose another")]
    UnsafeOutput(PathBuf),
}

/// What a build produced.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    /// Root pages written, in name order.
    pub pages: Vec<PageReport>,
    /// Detail pages written per collection.
    pub detail_pages: Vec<(Collection, usize)>,
    /// Record counts per collection.
    pub counts: Vec<(Collection, usize)>,
    pub assets_copied: usize,
    pub root_files: Vec<String>,
    pub sitemap_urls: usize,
    pub skipped: Vec<Skipped>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub name: String,
    /// Set when the page carries a pre-rendered listing.
    pub listing: Option<ListingSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSummary {
    pub collection: Collection,
    pub items: usize,
    pub pages: usize,
}

/// Build the site in `source` into `output`.
pub fn build(
    source: &Path,
    output: &Path,
    config: &SiteConfig,
) -> Result<BuildReport, GenerateError> {
    let content = load_content(source)?;
    prepare_output(source, output, config)?;

    let mut report = BuildReport {
        output_dir: output.to_path_buf(),
        counts: Collection::ALL
            .iter()
            .map(|&c| (c, content.count(c)))
            .collect(),
        skipped: content.skipped.clone(),
        ..Default::default()
    };

    let assets = source.join(&config.build.assets_dir);
    if assets.is_dir() {
        report.assets_copied = copy_dir(&assets, &output.join(&config.build.assets_dir))?;
    }
    report.root_files = copy_root_files(source, output, config)?;
    report.pages = render_root_pages(source, output, config, &content)?;
    report.detail_pages = write_detail_pages(output, config, &content)?;
    write_data_files(output, &content)?;
    report.sitemap_urls = write_sitemap(output, config, &content)?;

    info!(output = %output.display(), "site generated");
    Ok(report)
}

/// Result of [`check`]: what a build would see, without writing anything.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub counts: Vec<(Collection, usize)>,
    pub skipped: Vec<Skipped>,
    pub issues: Vec<Issue>,
    /// Configured listing pages with no matching root file.
    pub missing_pages: Vec<String>,
    /// Listing pages that exist but never use `{{listing}}`.
    pub unused_listings: Vec<String>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
            && self.issues.is_empty()
            && self.missing_pages.is_empty()
            && self.unused_listings.is_empty()
    }
}

/// Load and validate the project in `source`.
pub fn check(source: &Path, config: &SiteConfig) -> Result<CheckReport, GenerateError> {
    let content = load_content(source)?;
    let mut report = CheckReport {
        counts: Collection::ALL
            .iter()
            .map(|&c| (c, content.count(c)))
            .collect(),
        issues: validate(&content),
        skipped: content.skipped,
        ..Default::default()
    };

    for listing in &config.listings {
        let path = source.join(&listing.page);
        if !path.is_file() {
            report.missing_pages.push(listing.page.clone());
            continue;
        }
        let template = fs::read_to_string(&path)?;
        if !placeholders(&template).contains(&"listing") {
            report.unused_listings.push(listing.page.clone());
        }
    }
    Ok(report)
}

/// Remove and recreate `output`. Refuses an output that contains the
/// project, or that is, contains or sits inside one of its inputs.
fn prepare_output(source: &Path, output: &Path, config: &SiteConfig) -> Result<(), GenerateError> {
    let output_abs = resolve(output)?;
    let unsafe_output = || GenerateError::UnsafeOutput(output.to_path_buf());
    if source.canonicalize()?.starts_with(&output_abs) {
        return Err(unsafe_output());
    }
    for input in build_inputs(source, config)? {
        let input = input.canonicalize()?;
        if input.starts_with(&output_abs) || output_abs.starts_with(&input) {
            debug!(input = %input.display(), "output overlaps a build input");
            return Err(unsafe_output());
        }
    }

    if output.exists() {
        fs::remove_dir_all(output)?;
    }
    fs::create_dir_all(output)?;
    Ok(())
}

/// Existing paths a build reads: `content/`, the assets directory, root
/// files and root pages.
fn build_inputs(source: &Path, config: &SiteConfig) -> Result<Vec<PathBuf>, GenerateError> {
    let mut inputs = vec![
        source.join("content"),
        source.join(&config.build.assets_dir),
    ];
    inputs.extend(config.build.root_files.iter().map(|name| source.join(name)));
    for entry in fs::read_dir(source)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "html") {
            inputs.push(path);
        }
    }
    inputs.retain(|path| path.exists());
    Ok(inputs)
}

/// Absolute form of `path` with symlinks resolved through its nearest
/// existing ancestor, so outputs that don't exist yet compare correctly.
fn resolve(path: &Path) -> Result<PathBuf, GenerateError> {
    let path = std::path::absolute(path)?;
    let mut existing = path.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => break,
        }
    }
    let mut resolved = existing.canonicalize()?;
    resolved.extend(missing.iter().rev());
    Ok(resolved)
}

/// Copy a directory tree, returning the number of files copied.
fn copy_dir(src: &Path, dst: &Path) -> Result<usize, GenerateError> {
    let mut copied = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    debug!(src = %src.display(), copied, "copied directory");
    Ok(copied)
}

/// Copy configured root files verbatim. HTML files are skipped here; they
/// go through placeholder substitution with the other root pages.
fn copy_root_files(
    source: &Path,
    output: &Path,
    config: &SiteConfig,
) -> Result<Vec<String>, GenerateError> {
    let mut copied = Vec::new();
    for name in &config.build.root_files {
        let path = source.join(name);
        if !path.is_file() || name.ends_with(".html") {
            continue;
        }
        fs::copy(&path, output.join(name))?;
        copied.push(name.clone());
    }
    Ok(copied)
}

// ============================================================================
// Root pages
// ============================================================================

fn base_template_data(config: &SiteConfig) -> TemplateData {
    let mut data = TemplateData::new();
    data.insert("site_name".into(), config.site_name.clone());
    data.insert("site_url".into(), config.site_url.clone());
    data.insert("year".into(), Local::now().year().to_string());
    data
}

fn render_root_pages(
    source: &Path,
    output: &Path,
    config: &SiteConfig,
    content: &SiteContent,
) -> Result<Vec<PageReport>, GenerateError> {
    let mut names: Vec<String> = fs::read_dir(source)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".html"))
        .collect();
    names.sort();

    let base = base_template_data(config);
    let mut pages = Vec::with_capacity(names.len());
    for name in names {
        let template = fs::read_to_string(source.join(&name))?;
        let mut data = base.clone();
        let listing = match config.listing_for(&name) {
            Some(listing) => listing_placeholders(listing, config, content, &mut data),
            None => None,
        };
        fs::write(output.join(&name), render_template(&template, &data))?;
        debug!(page = %name, "rendered page");
        pages.push(PageReport { name, listing });
    }
    Ok(pages)
}

/// Pre-render the first page of a listing into the template data.
fn listing_placeholders(
    listing: &ListingPage,
    config: &SiteConfig,
    content: &SiteContent,
    data: &mut TemplateData,
) -> Option<ListingSummary> {
    let collection = listing.collection()?;
    let listing_config = ListingConfig {
        search_fields: listing.search_fields.clone(),
        items_per_page: listing
            .items_per_page
            .unwrap_or(config.listing.items_per_page),
        ..Default::default()
    };
    let containers = (
        listing_config.container.clone(),
        listing_config.filters.clone(),
        listing_config.results_count.clone(),
    );
    let snap = snapshot(content.collection(collection), listing_config, "", 1);

    data.insert("listing".into(), snap.html(&containers.0).to_string());
    data.insert("filters".into(), snap.html(&containers.1).to_string());
    data.insert("results_count".into(), snap.html(&containers.2).to_string());
    data.insert(
        "listing_data".into(),
        format!("data/{}.json", collection.name()),
    );
    Some(ListingSummary {
        collection,
        items: snap.total,
        pages: snap.total_pages,
    })
}

// ============================================================================
// Detail pages
// ============================================================================

fn write_detail_pages(
    output: &Path,
    config: &SiteConfig,
    content: &SiteContent,
) -> Result<Vec<(Collection, usize)>, GenerateError> {
    let mut jobs: Vec<(PathBuf, Markup)> = Vec::new();

    let games: Vec<(PathBuf, Markup)> = content
        .games
        .par_iter()
        .map(|game| {
            let related = related_games(game, &content.games, RELATED_GAMES);
            (detail_path(output, game), render_game_page(game, &related, config))
        })
        .collect();
    let games_written = games.len();
    jobs.extend(games);

    let posts: Vec<(PathBuf, Markup)> = content
        .posts
        .par_iter()
        .enumerate()
        .map(|(idx, post)| {
            // posts are newest first: "previous" is the older one
            let newer = idx.checked_sub(1).map(|i| &content.posts[i]);
            let older = content.posts.get(idx + 1);
            (
                detail_path(output, &post.record),
                render_post_page(post, newer, older, config),
            )
        })
        .collect();
    let posts_written = posts.len();
    jobs.extend(posts);

    let team: Vec<(PathBuf, Markup)> = content
        .team
        .par_iter()
        .map(|member| (detail_path(output, member), render_member_page(member, config)))
        .collect();
    let team_written = team.len();
    jobs.extend(team);

    for dir in Collection::ALL.iter().filter_map(|c| c.detail_dir()) {
        fs::create_dir_all(output.join(dir))?;
    }
    jobs.into_par_iter()
        .try_for_each(|(path, markup)| fs::write(path, markup.into_string()))?;

    Ok(vec![
        (Collection::Games, games_written),
        (Collection::Blog, posts_written),
        (Collection::Team, team_written),
    ])
}

fn detail_path(output: &Path, record: &ContentRecord) -> PathBuf {
    output.join(record.detail_path.as_deref().unwrap_or_default())
}

/// Games sharing a genre with `game`, topped up with other games.
pub fn related_games<'a>(
    game: &ContentRecord,
    games: &'a [ContentRecord],
    limit: usize,
) -> Vec<&'a ContentRecord> {
    let genres: Vec<&str> = game
        .genre
        .as_ref()
        .map(|g| g.values())
        .unwrap_or_default();
    let others = || games.iter().filter(|g| g.slug != game.slug);

    let mut related: Vec<&ContentRecord> = others()
        .filter(|g| {
            g.genre
                .as_ref()
                .is_some_and(|v| v.values().iter().any(|x| genres.contains(x)))
        })
        .take(limit)
        .collect();
    for candidate in others() {
        if related.len() >= limit {
            break;
        }
        if !related.iter().any(|r| r.slug == candidate.slug) {
            related.push(candidate);
        }
    }
    related
}

/// Renders the base HTML document structure. `root` is the relative path
/// back to the site root ("" or "../").
fn base_document(title: &str, config: &SiteConfig, root: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " | " (config.site_name) }
                link rel="stylesheet" href={ (root) (STYLESHEET) };
            }
            body {
                (site_header(config, root))
                main { (content) }
                footer.site-footer {
                    p { "© " (Local::now().year()) " " (config.site_name) }
                }
            }
        }
    }
}

fn site_header(config: &SiteConfig, root: &str) -> Markup {
    html! {
        header.site-header {
            a.logo href={ (root) "index.html" } { (config.site_name) }
            nav.site-nav {
                a href={ (root) "games.html" } { "Games" }
                a href={ (root) "blog.html" } { "Blog" }
                a href={ (root) "team.html" } { "Team" }
                a href={ (root) "awards.html" } { "Awards" }
            }
        }
    }
}

fn tag_list(tags: &[String]) -> Markup {
    html! {
        @if !tags.is_empty() {
            div.tags {
                @for tag in tags {
                    span.tag { (tag) }
                }
            }
        }
    }
}

/// Markdown to HTML with tables, footnotes and strikethrough.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

fn render_game_page(
    game: &ContentRecord,
    related: &[&ContentRecord],
    config: &SiteConfig,
) -> Markup {
    let content = html! {
        article.game-detail {
            a.btn.btn-ghost href="../games.html" { "← Back to Games" }
            header {
                h1 { (game.title) }
                @if let Some(status) = &game.status {
                    span.status { (status.joined()) }
                }
                @if let Some(date) = &game.release_date {
                    p.release-date { "Released " (format_date(date)) }
                }
            }
            @if let Some(src) = game.cover_image.as_deref().or(game.thumbnail.as_deref()) {
                img.cover-image src={ "../" (src) } alt=(game.title);
            }
            dl.game-facts {
                @if let Some(genre) = &game.genre {
                    dt { "Genre" } dd { (genre.values().join(", ")) }
                }
                @if let Some(platform) = &game.platform {
                    dt { "Platforms" } dd { (platform.values().join(", ")) }
                }
            }
            @if let Some(description) = &game.description {
                p.description { (description) }
            }
            (tag_list(&game.tags))
            @if !related.is_empty() {
                section.related {
                    h2 { "More Games" }
                    div.grid.grid-3 {
                        @for other in related {
                            a.card href={ (other.slug.as_deref().unwrap_or_default()) ".html" } {
                                h3 { (other.title) }
                            }
                        }
                    }
                }
            }
        }
    };
    base_document(&game.title, config, "../", content)
}

fn render_post_page(
    post: &Post,
    newer: Option<&Post>,
    older: Option<&Post>,
    config: &SiteConfig,
) -> Markup {
    let record = &post.record;
    let author = record.extra.get("author").and_then(|v| v.as_str());
    let read_time = record.extra.get("readTime").and_then(|v| v.as_u64());
    let content = html! {
        article.post {
            a.btn.btn-ghost href="../blog.html" { "← Back to Blog" }
            header {
                (tag_list(&record.tags))
                h1 { (record.title) }
                div.post-meta {
                    @if let Some(author) = author {
                        span { "By " strong { (author) } }
                    }
                    @if let Some(date) = &record.date {
                        time datetime=(date) { (format_date(date)) }
                    }
                    @if let Some(minutes) = read_time {
                        span { (minutes) " minute read" }
                    }
                }
                @if let Some(src) = &record.cover_image {
                    img.cover-image src={ "../" (src) } alt=(record.title);
                }
            }
            div.prose { (PreEscaped(render_markdown(&post.body))) }
            nav.post-nav {
                @if let Some(older) = older {
                    a.prev href={ (older.record.slug.as_deref().unwrap_or_default()) ".html" } {
                        "← " (older.record.title)
                    }
                }
                @if let Some(newer) = newer {
                    a.next href={ (newer.record.slug.as_deref().unwrap_or_default()) ".html" } {
                        (newer.record.title) " →"
                    }
                }
            }
        }
    };
    base_document(&record.title, config, "../", content)
}

fn render_member_page(member: &ContentRecord, config: &SiteConfig) -> Markup {
    let skills: Vec<&str> = member
        .extra
        .get("skills")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(|s| s.as_str()).collect())
        .unwrap_or_default();
    let content = html! {
        article.team-member {
            a.btn.btn-ghost href="../team.html" { "← Back to Team" }
            @if let Some(src) = member.image() {
                img.avatar src={ "../" (src) } alt=(member.title);
            }
            h1 { (member.title) }
            @if let Some(role) = &member.role {
                p.role { (role.joined()) }
            }
            @if let Some(bio) = &member.bio {
                p.bio { (bio) }
            }
            @if !skills.is_empty() {
                div.tags {
                    @for skill in &skills {
                        span.tag { (skill) }
                    }
                }
            }
        }
    };
    base_document(&member.title, config, "../", content)
}

// ============================================================================
// Data files and sitemap
// ============================================================================

fn write_data_files(output: &Path, content: &SiteContent) -> Result<(), GenerateError> {
    let data_dir = output.join("data");
    fs::create_dir_all(&data_dir)?;
    for collection in Collection::ALL {
        let json = serde_json::to_string_pretty(&content.collection(collection))?;
        fs::write(data_dir.join(format!("{}.json", collection.name())), json)?;
    }
    Ok(())
}

/// Returns the number of URLs written.
fn write_sitemap(
    output: &Path,
    config: &SiteConfig,
    content: &SiteContent,
) -> Result<usize, GenerateError> {
    let entries = sitemap_entries(config, content);
    let xml = render_sitemap(config, &entries, &Local::now().format("%Y-%m-%d").to_string());
    fs::write(output.join("sitemap.xml"), xml)?;
    Ok(entries.len())
}

fn sitemap_entries(config: &SiteConfig, content: &SiteContent) -> Vec<(String, f64)> {
    let mut entries: Vec<(String, f64)> = config
        .sitemap
        .pages
        .iter()
        .map(|p| (p.path.clone(), p.priority))
        .collect();
    let detail = |r: &ContentRecord| r.detail_path.clone().unwrap_or_default();
    entries.extend(content.games.iter().map(|g| (detail(g), 0.8)));
    entries.extend(content.posts.iter().map(|p| (detail(&p.record), 0.7)));
    entries
}

pub fn render_sitemap(config: &SiteConfig, entries: &[(String, f64)], lastmod: &str) -> String {
    let base = config.site_url.trim_end_matches('/');
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for (path, priority) in entries {
        xml.push_str(&format!(
            "  <url>\n    <loc>{base}/{}</loc>\n    <changefreq>{}</changefreq>\n    \
             <priority>{priority:.1}</priority>\n    <lastmod>{lastmod}</lastmod>\n  </url>\n",
            xml_escape(path),
            xml_escape(&config.sitemap.changefreq),
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
