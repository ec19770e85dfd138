//! Site configuration module.
//!
//! Handles loading, validating, and merging `site.toml`. The user's file is
//! a sparse overlay on the stock defaults: it names only what it changes.
//!
//! ## Config File Location
//!
//! ```text
//! my-site/
//! ├── site.toml          # optional; overrides stock defaults
//! ├── index.html
//! ├── games.html
//! ├── assets/
//! └── content/
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! site_name = "Atlas Games"
//! site_url = "https://example.com"
//!
//! [listing]
//! items_per_page = 12       # Cards per page on every listing
//!
//! [build]
//! assets_dir = "assets"
//! root_files = ["robots.txt", "manifest.webmanifest", "404.html"]
//!
//! [sitemap]
//! changefreq = "weekly"
//! pages = [{ path = "", priority = 1.0 }, { path = "games.html", priority = 0.9 }]
//!
//! [[listings]]
//! page = "games.html"       # Root page with {{listing}} placeholders
//! data = "games"            # Collection rendered into it
//! search_fields = ["title", "description", "tags"]
//! ```
//!
//! ## Partial Configuration
//!
//! ```toml
//! # Only change the page size
//! [listing]
//! items_per_page = 9
//! ```
//!
//! Tables merge key by key; arrays (including `[[listings]]`) replace the
//! stock value wholesale. Unknown keys are rejected to catch typos early.

use crate::content::Collection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILE: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Studio name, substituted for `{{site_name}}`.
    pub site_name: String,
    /// Absolute base URL used in the sitemap.
    pub site_url: String,
    pub listing: ListingDefaults,
    pub build: BuildConfig,
    pub sitemap: SitemapConfig,
    /// Root pages that get a pre-rendered listing.
    pub listings: Vec<ListingPage>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "Atlas Games".to_string(),
            site_url: "https://example.com".to_string(),
            listing: ListingDefaults::default(),
            build: BuildConfig::default(),
            sitemap: SitemapConfig::default(),
            listings: vec![
                ListingPage::new("games.html", "games", &["title", "description", "tags"]),
                ListingPage::new("blog.html", "blog", &["title", "excerpt", "tags"]),
                ListingPage::new("team.html", "team", &["title", "role", "bio"]),
                ListingPage::new("awards.html", "awards", &["title", "competition"]),
            ],
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.site_url.starts_with("http://") || self.site_url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "site_url must be an absolute http(s) URL, got {:?}",
                self.site_url
            )));
        }
        if self.listing.items_per_page == 0 {
            return Err(ConfigError::Validation(
                "listing.items_per_page must be at least 1".into(),
            ));
        }
        for page in &self.sitemap.pages {
            if !(0.0..=1.0).contains(&page.priority) {
                return Err(ConfigError::Validation(format!(
                    "sitemap priority for {:?} must be 0.0-1.0",
                    page.path
                )));
            }
        }
        for listing in &self.listings {
            if Collection::from_name(&listing.data).is_none() {
                return Err(ConfigError::Validation(format!(
                    "listings.data {:?} is not a collection (games, blog, team, awards)",
                    listing.data
                )));
            }
            if !listing.page.ends_with(".html") {
                return Err(ConfigError::Validation(format!(
                    "listings.page {:?} must be an .html file",
                    listing.page
                )));
            }
            if listing.items_per_page == Some(0) {
                return Err(ConfigError::Validation(format!(
                    "listings.items_per_page for {:?} must be at least 1",
                    listing.page
                )));
            }
        }
        Ok(())
    }

    /// The listing configured for `page`, if any.
    pub fn listing_for(&self, page: &str) -> Option<&ListingPage> {
        self.listings.iter().find(|l| l.page == page)
    }
}

/// Defaults shared by every listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingDefaults {
    pub items_per_page: usize,
}

impl Default for ListingDefaults {
    fn default() -> Self {
        Self { items_per_page: 12 }
    }
}

/// What the build copies verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Directory copied recursively to `<output>/<assets_dir>`.
    pub assets_dir: String,
    /// Files copied from the project root when present.
    pub root_files: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            assets_dir: "assets".to_string(),
            root_files: vec![
                "robots.txt".to_string(),
                "manifest.webmanifest".to_string(),
                "404.html".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SitemapConfig {
    pub changefreq: String,
    /// Fixed pages; game and post pages are appended automatically.
    pub pages: Vec<SitemapPage>,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        let pages = [
            ("", 1.0),
            ("games.html", 0.9),
            ("team.html", 0.8),
            ("blog.html", 0.8),
            ("about.html", 0.7),
            ("contact.html", 0.7),
            ("awards.html", 0.6),
            ("art.html", 0.6),
        ];
        Self {
            changefreq: "weekly".to_string(),
            pages: pages
                .into_iter()
                .map(|(path, priority)| SitemapPage {
                    path: path.to_string(),
                    priority,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SitemapPage {
    /// Path relative to `site_url`; empty for the home page.
    pub path: String,
    pub priority: f64,
}

/// A root page whose `{{listing}}`, `{{filters}}` and `{{results_count}}`
/// placeholders are filled with the first page of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListingPage {
    pub page: String,
    /// Collection name: games, blog, team, or awards.
    pub data: String,
    #[serde(default = "default_search_fields")]
    pub search_fields: Vec<String>,
    /// Overrides `listing.items_per_page` for this page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_per_page: Option<usize>,
}

fn default_search_fields() -> Vec<String> {
    vec!["title".to_string()]
}

impl ListingPage {
    fn new(page: &str, data: &str, search_fields: &[&str]) -> Self {
        Self {
            page: page.to_string(),
            data: data.to_string(),
            search_fields: search_fields.iter().map(|f| f.to_string()).collect(),
            items_per_page: None,
        }
    }

    pub fn collection(&self) -> Option<Collection> {
        Collection::from_name(&self.data)
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Every default as a TOML table; the layer `site.toml` is merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Lay `overlay` over `base`. Tables merge per key, recursing into nested
/// tables; any other overlay value, arrays included, wins outright.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    let mut merged = match base {
        toml::Value::Table(table) => table,
        _ => return overlay,
    };
    let overrides = match overlay {
        toml::Value::Table(table) => table,
        other => return other,
    };
    for (key, value) in overrides {
        let value = match merged.remove(&key) {
            Some(existing) => merge_toml(existing, value),
            None => value,
        };
        merged.insert(key, value);
    }
    toml::Value::Table(merged)
}

/// Parsed `site.toml` under `root`; `None` when the project has none.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let path = root.join(CONFIG_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path)?;
    Ok(Some(toml::from_str(&text)?))
}

/// Apply `overlay` (if any) to `base`, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let value = if let Some(o) = overlay { merge_toml(base, o) } else { base };
    let config: SiteConfig = value.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Stock defaults plus the project's `site.toml`, validated.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(root)?)
}

/// A documented `site.toml` with every option at its default.
pub fn stock_config_toml() -> &'static str {
    r##"# Atlas Site Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Tables merge with the defaults key by key. Arrays, including the
# [[listings]] entries, replace the defaults entirely.
# Unknown keys will cause an error.

# Studio name, available to pages as {{site_name}}.
site_name = "Atlas Games"

# Absolute base URL, used for sitemap.xml and {{site_url}}.
site_url = "https://example.com"

# ---------------------------------------------------------------------------
# Listings
# ---------------------------------------------------------------------------
[listing]
# Cards per page on every listing page.
items_per_page = 12

# ---------------------------------------------------------------------------
# Build
# ---------------------------------------------------------------------------
[build]
# Directory copied recursively into the output.
assets_dir = "assets"

# Files copied from the project root when they exist.
root_files = ["robots.txt", "manifest.webmanifest", "404.html"]

# ---------------------------------------------------------------------------
# Sitemap
# ---------------------------------------------------------------------------
[sitemap]
changefreq = "weekly"

# Fixed pages. Every game and blog post page is added automatically.
pages = [
    { path = "", priority = 1.0 },
    { path = "games.html", priority = 0.9 },
    { path = "team.html", priority = 0.8 },
    { path = "blog.html", priority = 0.8 },
    { path = "about.html", priority = 0.7 },
    { path = "contact.html", priority = 0.7 },
    { path = "awards.html", priority = 0.6 },
    { path = "art.html", priority = 0.6 },
]

# ---------------------------------------------------------------------------
# Listing pages
# ---------------------------------------------------------------------------
# Each entry pre-renders the first page of a collection into a root page's
# {{listing}}, {{filters}} and {{results_count}} placeholders.
#   page           root .html file
#   data           games, blog, team, or awards
#   search_fields  fields the text search looks at
#   items_per_page optional per-page override

[[listings]]
page = "games.html"
data = "games"
search_fields = ["title", "description", "tags"]

[[listings]]
page = "blog.html"
data = "blog"
search_fields = ["title", "excerpt", "tags"]

[[listings]]
page = "team.html"
data = "team"
search_fields = ["title", "role", "bio"]

[[listings]]
page = "awards.html"
data = "awards"
search_fields = ["title", "competition"]
"##
}
