//! # Atlas Site
//!
//! The website of a small independent game studio: hand-written HTML pages,
//! JSON and Markdown content, and listing pages (games, devlog, team, awards)
//! that visitors can search, filter, sort and page through.
//!
//! # Architecture
//!
//! Two halves share one record model:
//!
//! ```text
//! Build     content/ + *.html  →  dist/           (pages, detail pages, data/*.json, sitemap)
//! Listing   data + URL query   →  rendered page   (search → filter → sort → paginate)
//! ```
//!
//! The listing half is written against a small [`document::Document`] model
//! instead of a browser DOM: named containers whose HTML is replaced, the
//! page's query string, and a scroll request. Control interactions arrive as
//! typed [`filters::ControlEvent`]s. The same code pre-renders the first page
//! of every listing at build time and answers `atlas-site query` from the CLI.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`record`] | `ContentRecord`, the superset shape of every listing item |
//! | [`utils`] | Debouncer, date parsing and formatting, query strings, slugs, text helpers |
//! | [`search`] | Text search, advanced filtering, sorting, facet option extraction |
//! | [`filters`] | Filter state, URL sync, control rendering and events |
//! | [`listing`] | Data loading, load states, pagination, card rendering |
//! | [`document`] | The page model listing code renders into |
//! | [`content`] | Loads `content/` into collections, front matter, validation |
//! | [`template`] | `{{key}}` substitution for root pages |
//! | [`generate`] | Builds `dist/` and checks a project |
//! | [`config`] | `site.toml` loading, stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Maud For Generated Markup
//!
//! Cards, filter controls, pagination and detail pages are built with
//! [Maud](https://maud.lambda.xyz/). Interpolated record text is escaped
//! automatically, so titles and descriptions from content files cannot
//! inject markup.
//!
//! ## Filters Notify, The Listing Renders
//!
//! [`filters::Filters`] owns the filter state and emits it to a
//! [`filters::FilterListener`]. The listing loader keeps the listener as a
//! separate field so both can be borrowed at once; there are no shared
//! mutable handles.
//!
//! ## Deterministic Time
//!
//! Debounced search takes explicit `Instant`s. The caller feeds
//! `ControlEvent::Tick` from its event loop, which makes the 300 ms window
//! testable without sleeping.

pub mod config;
pub mod content;
pub mod document;
pub mod filters;
pub mod generate;
pub mod listing;
pub mod output;
pub mod record;
pub mod search;
pub mod template;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_helpers;
