//! The listing orchestrator: load, filter, paginate, render.
//!
//! One [`ListingLoader`] drives one listing page. It owns the [`Search`]
//! over the loaded collection, the [`Filters`] control surface, and the
//! pagination state, and renders everything into a [`Document`].
//!
//! ```text
//!            begin_load                complete_load(Ok)
//!   ──────▶ Loading ──────────────────────────────────▶ Ready ◀─┐
//!              ▲   │ complete_load(Err)                  │      │ filter change,
//!              │   ▼                                     │      │ go_to_page
//!              │  Error                                  └──────┘
//!              └── refresh ◀──── (Ready | Error)
//! ```
//!
//! Loads are split into [`begin_load`](ListingLoader::begin_load) and
//! [`complete_load`](ListingLoader::complete_load) so a caller can fetch
//! elsewhere. Each begin hands out a [`LoadTicket`]; only the newest ticket
//! is honored, so a slow fetch finishing after a newer refresh is dropped.
//!
//! ## Rendered containers
//!
//! | Selector (default) | Content                                            |
//! |--------------------|----------------------------------------------------|
//! | `#listing`         | loading / error / empty message, or grid + pager   |
//! | `#filters`         | the [`Filters`] control surface                    |
//! | `#results-count`   | "Showing 1-12 of 40 results" / "No results found"  |
//!
//! Any of them may be absent from the page; writes to a missing container
//! are dropped.

use crate::document::Document;
use crate::filters::{ControlEvent, FilterListener, FilterState, Filters};
use crate::record::ContentRecord;
use crate::search::{DEFAULT_SEARCH_FIELDS, Search};
use crate::utils::{format_date, slugify};
use maud::{Markup, html};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

/// Pixels kept clear above the listing when paging scrolls it into view.
pub const SCROLL_OFFSET: u32 = 100;

pub const DEFAULT_ITEMS_PER_PAGE: usize = 12;

/// Message shown in place of the listing when the load fails.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load data. Please try again later.";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid listing data in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("data source unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// Data sources
// ============================================================================

/// Where a listing's collection comes from.
pub trait DataSource {
    fn fetch(&self) -> Result<Vec<ContentRecord>, LoadError>;
}

impl<F> DataSource for F
where
    F: Fn() -> Result<Vec<ContentRecord>, LoadError>,
{
    fn fetch(&self) -> Result<Vec<ContentRecord>, LoadError> {
        self()
    }
}

/// A JSON array of records on disk, e.g. `dist/data/games.json`.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for JsonFileSource {
    fn fetch(&self) -> Result<Vec<ContentRecord>, LoadError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| LoadError::Json {
            path: self.path.clone(),
            source,
        })
    }
}

// ============================================================================
// Configuration and state
// ============================================================================

/// Renders the inside of one `<article class="card">`.
pub type CardTemplate = Box<dyn Fn(&ContentRecord) -> Markup>;

pub struct ListingConfig {
    pub container: String,
    pub filters: String,
    pub results_count: String,
    pub search_fields: Vec<String>,
    pub items_per_page: usize,
    /// Falls back to [`default_card`] when unset.
    pub card_template: Option<CardTemplate>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            container: "#listing".into(),
            filters: "#filters".into(),
            results_count: "#results-count".into(),
            search_fields: DEFAULT_SEARCH_FIELDS.iter().map(|f| f.to_string()).collect(),
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            card_template: None,
        }
    }
}

impl ListingConfig {
    pub fn with_card_template(
        mut self,
        template: impl Fn(&ContentRecord) -> Markup + 'static,
    ) -> Self {
        self.card_template = Some(Box::new(template));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    /// Carries the logged failure text.
    Error(String),
}

/// Identifies one load; see [`ListingLoader::complete_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

// ============================================================================
// Pagination
// ============================================================================

/// `ceil(len / per_page)`.
pub fn total_pages(len: usize, per_page: usize) -> usize {
    len.div_ceil(per_page.max(1))
}

/// Page numbers shown in the pager: up to two either side of `current`,
/// clamped to `1..=total`.
pub fn page_window(current: usize, total: usize) -> RangeInclusive<usize> {
    let start = current.saturating_sub(2).max(1);
    let end = (current + 2).min(total);
    start..=end
}

/// The slice of `items` shown on 1-based `page`.
pub fn page_slice<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    let per_page = per_page.max(1);
    let start = page.saturating_sub(1).saturating_mul(per_page).min(items.len());
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}

/// "Showing {start}-{end} of {total} results".
pub fn results_count_text(total: usize, page: usize, per_page: usize) -> String {
    if total == 0 {
        return "No results found".to_string();
    }
    let per_page = per_page.max(1);
    let start = (page.max(1) - 1) * per_page + 1;
    let end = (start + per_page - 1).min(total);
    format!("Showing {start}-{end} of {total} results")
}

// ============================================================================
// View: the half of the loader that reacts to filter changes
// ============================================================================

/// Everything the loader renders, separate from [`Filters`] so the two can
/// be borrowed independently while filters notify the view.
pub struct ListingView {
    container: String,
    results_count: String,
    items_per_page: usize,
    card_template: Option<CardTemplate>,
    search: Search,
    filtered: Vec<ContentRecord>,
    current_page: usize,
    state: LoadState,
}

impl FilterListener for ListingView {
    fn on_filter_change(&mut self, state: &FilterState, doc: &mut Document) {
        self.apply_filters(state, doc);
    }
}

impl ListingView {
    fn apply_filters(&mut self, criteria: &FilterState, doc: &mut Document) {
        if self.state != LoadState::Ready {
            debug!("filter change before data is ready, ignoring");
            return;
        }
        let mut filtered = self.search.advanced_search(criteria);
        if let Some(sort_by) = criteria.sort_by.as_deref() {
            let order = criteria.sort_order.unwrap_or_default();
            filtered = Search::sort(&filtered, sort_by, order);
        }
        debug!(
            matched = filtered.len(),
            total = self.search.records().len(),
            "filters applied"
        );
        self.filtered = filtered;
        self.current_page = 1;
        self.render(doc);
    }

    fn total_pages(&self) -> usize {
        total_pages(self.filtered.len(), self.items_per_page)
    }

    fn render(&self, doc: &mut Document) {
        let body = match &self.state {
            LoadState::Loading => return,
            LoadState::Error(_) => {
                doc.replace(&self.results_count, html! {});
                error_message(LOAD_FAILED_MESSAGE)
            }
            LoadState::Ready => {
                doc.replace(
                    &self.results_count,
                    html! { (results_count_text(self.filtered.len(), self.current_page, self.items_per_page)) },
                );
                self.render_ready()
            }
        };
        doc.replace(&self.container, body);
    }

    fn render_ready(&self) -> Markup {
        if self.search.records().is_empty() {
            return empty_collection();
        }
        if self.filtered.is_empty() {
            return no_results();
        }
        let page = page_slice(&self.filtered, self.current_page, self.items_per_page);
        html! {
            div.grid.grid-3 {
                @for item in page {
                    article.card {
                        @match &self.card_template {
                            Some(template) => { (template(item)) }
                            None => { (default_card(item)) }
                        }
                    }
                }
            }
            @if self.filtered.len() > self.items_per_page {
                (pagination(self.current_page, self.total_pages()))
            }
        }
    }
}

// ============================================================================
// Markup
// ============================================================================

pub fn loading_indicator() -> Markup {
    html! { div.loading role="status" { "Loading..." } }
}

pub fn no_results() -> Markup {
    html! {
        div.no-results {
            p { "No results found" }
            p.no-results-hint { "Try adjusting your search or filters." }
        }
    }
}

/// Shown when the collection itself has no items, as opposed to
/// [`no_results`] when filters exclude everything.
pub fn empty_collection() -> Markup {
    html! { div.empty-collection { p { "Nothing here yet. Check back soon." } } }
}

pub fn error_message(message: &str) -> Markup {
    html! { div.error-message role="alert" { p { (message) } } }
}

/// Card body assembled from whichever fields the record has.
pub fn default_card(item: &ContentRecord) -> Markup {
    let role = item.role.as_ref().filter(|v| !v.is_empty());
    let competition = item.competition.as_ref().filter(|v| !v.is_empty());
    let status = item.status.as_ref().filter(|v| !v.is_empty());
    html! {
        @if let Some(src) = item.image() {
            img.card-image src=(src) alt=(item.title) loading="lazy";
        }
        div.card-content {
            h3.card-title {
                @if let Some(href) = &item.detail_path {
                    a href=(href) { (item.title) }
                } @else {
                    (item.title)
                }
            }
            @if let Some(date) = item.effective_date().filter(|d| !d.is_empty()) {
                div.card-meta { (format_date(date)) }
            }
            @if let Some(role) = role {
                div.card-meta { (role.joined()) }
            }
            @if let Some(competition) = competition {
                div.card-meta { (competition.joined()) }
            }
            @if let Some(rank) = item.rank_text() {
                div.card-meta { "Rank: " (rank) }
            }
            p.card-description { (item.summary().unwrap_or_default()) }
            @if !item.tags.is_empty() {
                div.card-tags {
                    @for tag in &item.tags {
                        span.tag { (tag) }
                    }
                }
            }
            @if let Some(status) = status {
                span class=(format!("status status-{}", slugify(&status.joined()))) { (status.joined()) }
            }
        }
    }
}

pub fn pagination(current: usize, total: usize) -> Markup {
    html! {
        nav.pagination aria-label="Pagination navigation" {
            ul.pagination-list {
                @if current > 1 {
                    li { button.pagination-btn.prev type="button" data-page=(current - 1) { "Previous" } }
                }
                @for page in page_window(current, total) {
                    li {
                        button.pagination-btn.page.active[page == current] type="button"
                            data-page=(page) aria-current=[(page == current).then_some("page")] {
                            (page)
                        }
                    }
                }
                @if current < total {
                    li { button.pagination-btn.next type="button" data-page=(current + 1) { "Next" } }
                }
            }
        }
    }
}

// ============================================================================
// ListingLoader
// ============================================================================

pub struct ListingLoader<S> {
    source: S,
    filters: Filters,
    view: ListingView,
    /// Sequence number of the newest load.
    load_seq: u64,
    /// Whether the filter controls have been built from a first load.
    filters_ready: bool,
}

impl<S: DataSource> ListingLoader<S> {
    pub fn new(source: S, config: ListingConfig) -> Self {
        let ListingConfig {
            container,
            filters,
            results_count,
            search_fields,
            items_per_page,
            card_template,
        } = config;
        Self {
            source,
            filters: Filters::new(filters),
            view: ListingView {
                container,
                results_count,
                items_per_page: items_per_page.max(1),
                card_template,
                search: Search::new(Vec::new(), search_fields),
                filtered: Vec::new(),
                current_page: 1,
                state: LoadState::Loading,
            },
            load_seq: 0,
            filters_ready: false,
        }
    }

    /// Fetch and show the collection.
    pub fn init(&mut self, doc: &mut Document) -> &LoadState {
        let ticket = self.begin_load(doc);
        let result = self.source.fetch();
        self.complete_load(ticket, result, doc);
        &self.view.state
    }

    /// Re-fetch, discarding every filter, search, and sort choice.
    pub fn refresh(&mut self, doc: &mut Document) -> &LoadState {
        info!("refreshing listing");
        self.init(doc)
    }

    /// Fetch from the configured source without touching loader state.
    pub fn fetch(&self) -> Result<Vec<ContentRecord>, LoadError> {
        self.source.fetch()
    }

    /// Enter `Loading` and show the loading indicator.
    pub fn begin_load(&mut self, doc: &mut Document) -> LoadTicket {
        self.load_seq += 1;
        self.view.state = LoadState::Loading;
        doc.replace(&self.view.container, loading_indicator());
        LoadTicket(self.load_seq)
    }

    /// Finish the load identified by `ticket`. Returns false when a newer
    /// load has started since, in which case the result is dropped.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<ContentRecord>, LoadError>,
        doc: &mut Document,
    ) -> bool {
        if ticket.0 != self.load_seq {
            debug!(
                ticket = ticket.0,
                latest = self.load_seq,
                "discarding stale load"
            );
            return false;
        }

        let records = match result {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "error loading listing data");
                self.view.state = LoadState::Error(e.to_string());
                self.view.render(doc);
                return true;
            }
        };

        info!(count = records.len(), "listing data loaded");
        self.view.search.update_data(records);
        self.view.filtered = self.view.search.records().to_vec();
        self.view.current_page = 1;
        self.view.state = LoadState::Ready;
        self.view.render(doc);

        let options = self.view.search.filter_options();
        if self.filters_ready {
            self.filters.reset(doc);
            self.filters.update_options(options, doc);
        } else {
            self.filters_ready = true;
            self.filters.init(options, doc, &mut self.view);
        }
        true
    }

    /// Dispatch a control event to the filters.
    pub fn handle(&mut self, event: ControlEvent, doc: &mut Document) {
        if !self.filters_ready || self.view.state != LoadState::Ready {
            debug!(?event, state = ?self.view.state, "control event while not ready, ignoring");
            return;
        }
        self.filters.handle(event, doc, &mut self.view);
    }

    /// Show `page` (clamped to the valid range) and scroll the listing into view.
    pub fn go_to_page(&mut self, page: usize, doc: &mut Document) {
        if self.view.state != LoadState::Ready {
            return;
        }
        self.view.current_page = page.clamp(1, self.view.total_pages().max(1));
        self.view.render(doc);
        doc.scroll_into_view(&self.view.container, SCROLL_OFFSET);
    }

    pub fn state(&self) -> &LoadState {
        &self.view.state
    }

    pub fn data(&self) -> &[ContentRecord] {
        self.view.search.records()
    }

    pub fn filtered_data(&self) -> &[ContentRecord] {
        &self.view.filtered
    }

    /// Records on the current page.
    pub fn page_items(&self) -> &[ContentRecord] {
        page_slice(
            &self.view.filtered,
            self.view.current_page,
            self.view.items_per_page,
        )
    }

    pub fn current_page(&self) -> usize {
        self.view.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.view.total_pages()
    }

    pub fn items_per_page(&self) -> usize {
        self.view.items_per_page
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }
}

// ============================================================================
// Headless runs
// ============================================================================

/// One listing page rendered without a browser.
#[derive(Debug, Clone)]
pub struct ListingSnapshot {
    pub load_state: LoadState,
    /// The filter state the URL resolved to.
    pub filters: FilterState,
    pub total: usize,
    pub matched: usize,
    pub page: usize,
    pub total_pages: usize,
    pub items_per_page: usize,
    pub items: Vec<ContentRecord>,
    /// The page after rendering, with all three containers present.
    pub document: Document,
}

impl ListingSnapshot {
    pub fn html(&self, selector: &str) -> &str {
        self.document.container(selector).unwrap_or_default()
    }
}

/// Load `records`, apply `url_query` and show `page`, exactly as a visitor
/// arriving at that URL would see it.
pub fn snapshot(
    records: Vec<ContentRecord>,
    config: ListingConfig,
    url_query: &str,
    page: usize,
) -> ListingSnapshot {
    let mut document = Document::with_containers([
        config.container.clone(),
        config.filters.clone(),
        config.results_count.clone(),
    ]);
    document.set_query(url_query);

    let source = move || -> Result<Vec<ContentRecord>, LoadError> { Ok(records.clone()) };
    let mut loader = ListingLoader::new(source, config);
    loader.init(&mut document);
    if page > 1 {
        loader.go_to_page(page, &mut document);
        document.take_scroll();
    }

    ListingSnapshot {
        load_state: loader.state().clone(),
        filters: loader.filters().current().clone(),
        total: loader.data().len(),
        matched: loader.filtered_data().len(),
        page: loader.current_page(),
        total_pages: loader.total_pages(),
        items_per_page: loader.items_per_page(),
        items: loader.page_items().to_vec(),
        document,
    }
}
