//! The filter, search, and sort control surface of a listing page.
//!
//! [`Filters`] models the controls (one dropdown per facet, a sort select,
//! a free-text field, a date range, tag checkboxes, Clear All), turns user
//! events into a [`FilterState`], mirrors that state into the page URL, and
//! hands it to an injected [`FilterListener`]. It never filters records
//! itself; what "apply" means is up to the listener.
//!
//! ## Facets
//!
//! Facets are declared once in [`FACETS`]. Control rendering, URL keys,
//! active-state derivation, and record matching in
//! [`Search::advanced_search`](crate::search::Search::advanced_search) all
//! iterate that table, so adding a facet is a one-line change.
//!
//! ## URL contract
//!
//! ```text
//! ?query=sky&status=beta&platform=PC&tags=co-op&tags=cozy
//!  &dateFrom=2024-01-01&dateTo=2024-12-31&sortBy=title&sortOrder=asc
//! ```
//!
//! Inactive values (blank, or the `"all"` sentinel) are never written, and
//! [`FilterState::from_query_string`] reverses
//! [`FilterState::to_query_string`] exactly for active states.

use crate::document::Document;
use crate::record::{ContentRecord, FieldValue};
use crate::search::FilterOptions;
use crate::utils::{Debouncer, build_query, parse_query};
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};
use tracing::debug;

/// The facet value meaning "no constraint".
pub const ALL: &str = "all";

/// Quiet period before free-text input is applied.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Whether a facet value constrains anything.
///
/// Every sentinel comparison goes through here: absent, blank, and `"all"`
/// are all inactive.
pub fn is_active_filter_value(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.trim().is_empty() && v != ALL)
}

// ============================================================================
// Facets
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    Status,
    Genre,
    Platform,
    Role,
    Competition,
}

impl Facet {
    pub fn descriptor(self) -> &'static FacetDescriptor {
        &FACETS[self as usize]
    }

    /// URL and JSON key.
    pub fn key(self) -> &'static str {
        self.descriptor().key
    }

    pub fn from_key(key: &str) -> Option<Facet> {
        FACETS.iter().find(|d| d.key == key).map(|d| d.facet)
    }
}

/// How a facet value is matched against a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetMatch {
    /// Case-sensitive equality.
    Exact,
    /// The record's value contains the filter value.
    Contains,
}

/// Declarative description of one facet.
pub struct FacetDescriptor {
    pub facet: Facet,
    pub key: &'static str,
    pub label: &'static str,
    /// Label of the sentinel option, e.g. "All Statuses".
    pub all_label: &'static str,
    pub matching: FacetMatch,
    pub value: fn(&ContentRecord) -> Option<&FieldValue>,
    pub options: fn(&FilterOptions) -> Option<&[String]>,
}

fn status_of(r: &ContentRecord) -> Option<&FieldValue> {
    r.status.as_ref()
}
fn genre_of(r: &ContentRecord) -> Option<&FieldValue> {
    r.genre.as_ref()
}
fn platform_of(r: &ContentRecord) -> Option<&FieldValue> {
    r.platform.as_ref()
}
fn role_of(r: &ContentRecord) -> Option<&FieldValue> {
    r.role.as_ref()
}
fn competition_of(r: &ContentRecord) -> Option<&FieldValue> {
    r.competition.as_ref()
}

fn statuses(o: &FilterOptions) -> Option<&[String]> {
    o.statuses.as_deref()
}
fn genres(o: &FilterOptions) -> Option<&[String]> {
    o.genres.as_deref()
}
fn platforms(o: &FilterOptions) -> Option<&[String]> {
    o.platforms.as_deref()
}
fn roles(o: &FilterOptions) -> Option<&[String]> {
    o.roles.as_deref()
}
fn competitions(o: &FilterOptions) -> Option<&[String]> {
    o.competitions.as_deref()
}

/// All facets, in control order. Indexed by `Facet as usize`.
pub const FACETS: &[FacetDescriptor] = &[
    FacetDescriptor {
        facet: Facet::Status,
        key: "status",
        label: "Status",
        all_label: "All Statuses",
        matching: FacetMatch::Exact,
        value: status_of,
        options: statuses,
    },
    FacetDescriptor {
        facet: Facet::Genre,
        key: "genre",
        label: "Genre",
        all_label: "All Genres",
        matching: FacetMatch::Exact,
        value: genre_of,
        options: genres,
    },
    FacetDescriptor {
        facet: Facet::Platform,
        key: "platform",
        label: "Platform",
        all_label: "All Platforms",
        matching: FacetMatch::Contains,
        value: platform_of,
        options: platforms,
    },
    FacetDescriptor {
        facet: Facet::Role,
        key: "role",
        label: "Role",
        all_label: "All Roles",
        matching: FacetMatch::Exact,
        value: role_of,
        options: roles,
    },
    FacetDescriptor {
        facet: Facet::Competition,
        key: "competition",
        label: "Competition",
        all_label: "All Competitions",
        matching: FacetMatch::Exact,
        value: competition_of,
        options: competitions,
    },
];

// ============================================================================
// Sorting choices
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(s: &str) -> Option<SortOrder> {
        match s {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// The fixed entries of the sort dropdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOption {
    #[default]
    DateDesc,
    DateAsc,
    TitleAsc,
    TitleDesc,
    StatusAsc,
}

impl SortOption {
    pub const ALL: [SortOption; 5] = [
        SortOption::DateDesc,
        SortOption::DateAsc,
        SortOption::TitleAsc,
        SortOption::TitleDesc,
        SortOption::StatusAsc,
    ];

    /// The `<option>` value, `<sortBy>-<sortOrder>`.
    pub fn value(self) -> &'static str {
        match self {
            SortOption::DateDesc => "date-desc",
            SortOption::DateAsc => "date-asc",
            SortOption::TitleAsc => "title-asc",
            SortOption::TitleDesc => "title-desc",
            SortOption::StatusAsc => "status-asc",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOption::DateDesc => "Date (Newest)",
            SortOption::DateAsc => "Date (Oldest)",
            SortOption::TitleAsc => "Title (A-Z)",
            SortOption::TitleDesc => "Title (Z-A)",
            SortOption::StatusAsc => "Status",
        }
    }

    pub fn sort_by(self) -> &'static str {
        self.value().split('-').next().unwrap_or("date")
    }

    pub fn order(self) -> SortOrder {
        match self {
            SortOption::DateDesc | SortOption::TitleDesc => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    pub fn from_value(value: &str) -> Option<SortOption> {
        Self::ALL.into_iter().find(|o| o.value() == value)
    }

    pub fn from_parts(sort_by: &str, order: SortOrder) -> Option<SortOption> {
        Self::ALL
            .into_iter()
            .find(|o| o.sort_by() == sort_by && o.order() == order)
    }
}

// ============================================================================
// FilterState
// ============================================================================

/// Snapshot of every active search, filter, and sort choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

impl FilterState {
    pub fn facet(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Status => self.status.as_deref(),
            Facet::Genre => self.genre.as_deref(),
            Facet::Platform => self.platform.as_deref(),
            Facet::Role => self.role.as_deref(),
            Facet::Competition => self.competition.as_deref(),
        }
    }

    pub fn set_facet(&mut self, facet: Facet, value: Option<String>) {
        let slot = match facet {
            Facet::Status => &mut self.status,
            Facet::Genre => &mut self.genre,
            Facet::Platform => &mut self.platform,
            Facet::Role => &mut self.role,
            Facet::Competition => &mut self.competition,
        };
        *slot = value;
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Encode the active parts of the state as a URL query string.
    pub fn to_query_string(&self) -> String {
        let present = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        let mut pairs: Vec<(&str, String)> = Vec::new();

        if let Some(q) = present(&self.query) {
            pairs.push(("query", q));
        }
        for d in FACETS {
            let value = self.facet(d.facet);
            if is_active_filter_value(value) {
                pairs.push((d.key, value.unwrap_or_default().to_string()));
            }
        }
        for tag in self.tags.iter().filter(|t| !t.is_empty()) {
            pairs.push(("tags", tag.clone()));
        }
        if let Some(from) = present(&self.date_from) {
            pairs.push(("dateFrom", from));
        }
        if let Some(to) = present(&self.date_to) {
            pairs.push(("dateTo", to));
        }
        if let Some(by) = present(&self.sort_by) {
            pairs.push(("sortBy", by));
        }
        if let Some(order) = self.sort_order {
            pairs.push(("sortOrder", order.as_str().to_string()));
        }

        build_query(pairs.iter().map(|(k, v)| (*k, v.as_str())))
    }

    /// Decode a URL query string. Unknown keys and empty values are ignored;
    /// `tags` may repeat, any other repeated key keeps its last value.
    pub fn from_query_string(query: &str) -> FilterState {
        let mut state = FilterState::default();
        for (key, value) in parse_query(query) {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "query" => state.query = Some(value),
                "tags" => state.tags.push(value),
                "dateFrom" => state.date_from = Some(value),
                "dateTo" => state.date_to = Some(value),
                "sortBy" => state.sort_by = Some(value),
                "sortOrder" => {
                    if let Some(order) = SortOrder::parse(&value) {
                        state.sort_order = Some(order);
                    }
                }
                other => match Facet::from_key(other) {
                    Some(facet) => state.set_facet(facet, Some(value)),
                    None => debug!(key = other, "ignoring unknown query parameter"),
                },
            }
        }
        state
    }
}

// ============================================================================
// Events and listener
// ============================================================================

/// A user interaction with the control surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// A keystroke in the search field; applied after [`SEARCH_DEBOUNCE`].
    SearchInput { text: String, at: Instant },
    /// Enter in the search field, or the Search button.
    SubmitSearch,
    /// Event-loop clock tick; fires a pending debounced search.
    Tick(Instant),
    SelectFacet { facet: Facet, value: String },
    /// A sort `<option>` value such as `"title-asc"`.
    SelectSort(String),
    DateRange {
        from: Option<String>,
        to: Option<String>,
    },
    ToggleTag { tag: String, checked: bool },
    ClearAll,
}

/// Receives every emitted [`FilterState`].
pub trait FilterListener {
    fn on_filter_change(&mut self, state: &FilterState, doc: &mut Document);
}

impl<F> FilterListener for F
where
    F: FnMut(&FilterState, &mut Document),
{
    fn on_filter_change(&mut self, state: &FilterState, doc: &mut Document) {
        self(state, doc)
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Current value of every control.
#[derive(Debug, Clone, Default, PartialEq)]
struct Controls {
    search_text: String,
    /// Facets set to something other than the sentinel.
    selects: BTreeMap<Facet, String>,
    sort: SortOption,
    date_from: String,
    date_to: String,
    checked_tags: BTreeSet<String>,
}

pub struct Filters {
    selector: String,
    options: FilterOptions,
    controls: Controls,
    debouncer: Debouncer,
    active: FilterState,
}

impl Filters {
    /// Controls rendered into the container at `selector`.
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            options: FilterOptions::default(),
            controls: Controls::default(),
            debouncer: Debouncer::new(SEARCH_DEBOUNCE),
            active: FilterState::default(),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// The last emitted state.
    pub fn current(&self) -> &FilterState {
        &self.active
    }

    /// Build the controls for `options`, then restore state from the URL.
    /// Emits a change right away when the URL carried any parameters.
    pub fn init(
        &mut self,
        options: FilterOptions,
        doc: &mut Document,
        listener: &mut impl FilterListener,
    ) {
        self.options = options;
        self.controls = Controls::default();
        self.debouncer.cancel();
        self.active = FilterState::default();
        self.render_into(doc);

        if self.load_from_url(doc.query()) {
            self.handle_filter_change(doc, listener);
        }
    }

    /// Set controls from a query string. Returns whether it had any parameters.
    fn load_from_url(&mut self, query: &str) -> bool {
        let params = parse_query(query);
        if params.is_empty() {
            return false;
        }
        let state = FilterState::from_query_string(query);

        if let Some(q) = &state.query {
            self.controls.search_text = q.clone();
        }
        for d in FACETS {
            if let Some(value) = state.facet(d.facet) {
                self.select_facet(d.facet, value);
            }
        }
        for tag in &state.tags {
            self.set_tag(tag, true);
        }
        self.controls.date_from = state.date_from.clone().unwrap_or_default();
        self.controls.date_to = state.date_to.clone().unwrap_or_default();
        if state.sort_by.is_some() || state.sort_order.is_some() {
            let by = state.sort_by.as_deref().unwrap_or("date");
            let order = state.sort_order.unwrap_or(SortOrder::Desc);
            match SortOption::from_parts(by, order) {
                Some(option) => self.controls.sort = option,
                None => debug!(sort_by = by, "no sort option matches URL, keeping default"),
            }
        }
        true
    }

    /// Apply one user interaction.
    pub fn handle(
        &mut self,
        event: ControlEvent,
        doc: &mut Document,
        listener: &mut impl FilterListener,
    ) {
        match event {
            ControlEvent::SearchInput { text, at } => {
                self.controls.search_text = text;
                self.debouncer.schedule(at);
            }
            ControlEvent::Tick(now) => {
                if self.debouncer.fire(now) {
                    self.handle_filter_change(doc, listener);
                }
            }
            ControlEvent::SubmitSearch => {
                self.debouncer.cancel();
                self.handle_filter_change(doc, listener);
            }
            ControlEvent::SelectFacet { facet, value } => {
                self.select_facet(facet, &value);
                self.handle_filter_change(doc, listener);
            }
            ControlEvent::SelectSort(value) => {
                match SortOption::from_value(&value) {
                    Some(option) => self.controls.sort = option,
                    None => debug!(value = %value, "unknown sort option"),
                }
                self.handle_filter_change(doc, listener);
            }
            ControlEvent::DateRange { from, to } => {
                self.controls.date_from = from.unwrap_or_default();
                self.controls.date_to = to.unwrap_or_default();
                self.handle_filter_change(doc, listener);
            }
            ControlEvent::ToggleTag { tag, checked } => {
                self.set_tag(&tag, checked);
                self.handle_filter_change(doc, listener);
            }
            ControlEvent::ClearAll => self.clear_all_filters(doc, listener),
        }
    }

    /// Set a facet dropdown. Values the dropdown does not offer leave it on
    /// the sentinel, like a `<select>` given an unknown value.
    fn select_facet(&mut self, facet: Facet, value: &str) {
        let offered = (facet.descriptor().options)(&self.options)
            .is_some_and(|opts| opts.iter().any(|o| o == value));
        if is_active_filter_value(Some(value)) && offered {
            self.controls.selects.insert(facet, value.to_string());
        } else {
            self.controls.selects.remove(&facet);
        }
    }

    fn set_tag(&mut self, tag: &str, checked: bool) {
        let offered = self
            .options
            .tags
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|t| t == tag));
        if !offered {
            debug!(tag, "no checkbox for tag");
            return;
        }
        if checked {
            self.controls.checked_tags.insert(tag.to_string());
        } else {
            self.controls.checked_tags.remove(tag);
        }
    }

    fn handle_filter_change(&mut self, doc: &mut Document, listener: &mut impl FilterListener) {
        self.active = self.active_filters();
        doc.set_query(self.active.to_query_string());
        self.render_into(doc);
        listener.on_filter_change(&self.active, doc);
    }

    /// Read every control into a [`FilterState`]. Sort is always present.
    pub fn active_filters(&self) -> FilterState {
        let mut state = FilterState::default();

        let text = self.controls.search_text.trim();
        if !text.is_empty() {
            state.query = Some(text.to_string());
        }
        for (facet, value) in &self.controls.selects {
            if is_active_filter_value(Some(value)) {
                state.set_facet(*facet, Some(value.clone()));
            }
        }
        state.sort_by = Some(self.controls.sort.sort_by().to_string());
        state.sort_order = Some(self.controls.sort.order());

        let date_from = self.controls.date_from.trim();
        let date_to = self.controls.date_to.trim();
        state.date_from = (!date_from.is_empty()).then(|| date_from.to_string());
        state.date_to = (!date_to.is_empty()).then(|| date_to.to_string());

        // checkbox order, not click order
        if let Some(tags) = &self.options.tags {
            state.tags = tags
                .iter()
                .filter(|t| self.controls.checked_tags.contains(*t))
                .cloned()
                .collect();
        }
        state
    }

    /// Number of active constraints; each checked tag counts once and the
    /// date range counts once.
    pub fn active_filter_count(&self) -> usize {
        let state = self.active_filters();
        let facets = FACETS
            .iter()
            .filter(|d| is_active_filter_value(state.facet(d.facet)))
            .count();
        let dates = usize::from(state.date_from.is_some() || state.date_to.is_some());
        usize::from(state.query.is_some()) + facets + state.tags.len() + dates
    }

    /// Reset every control, clear the URL, and emit an empty state.
    pub fn clear_all_filters(&mut self, doc: &mut Document, listener: &mut impl FilterListener) {
        self.reset(doc);
        listener.on_filter_change(&self.active, doc);
    }

    /// Reset every control and clear the URL without emitting.
    pub fn reset(&mut self, doc: &mut Document) {
        self.controls = Controls::default();
        self.debouncer.cancel();
        self.active = FilterState::default();
        doc.set_query("");
        self.render_into(doc);
    }

    /// Swap in new option sets, dropping selections they no longer offer.
    pub fn update_options(&mut self, options: FilterOptions, doc: &mut Document) {
        self.options = options;
        let selects = std::mem::take(&mut self.controls.selects);
        for (facet, value) in selects {
            self.select_facet(facet, &value);
        }
        let tags = std::mem::take(&mut self.controls.checked_tags);
        for tag in tags {
            self.set_tag(&tag, true);
        }
        self.render_into(doc);
    }

    pub fn render_into(&self, doc: &mut Document) {
        doc.replace(&self.selector, self.render());
    }

    /// The control surface as HTML, reflecting current control values.
    pub fn render(&self) -> Markup {
        html! {
            div.search-filters {
                div.search-bar {
                    input.search-input type="text" id="search-input" placeholder="Search..."
                        aria-label="Search" value=(self.controls.search_text);
                    button.btn.btn-primary type="button" id="search-btn" { "Search" }
                }
                div.filters-row {
                    @for d in FACETS {
                        @if let Some(options) = (d.options)(&self.options).filter(|o| !o.is_empty()) {
                            (self.facet_select(d, options))
                        }
                    }
                    (self.sort_select())
                    div.filter-group {
                        button.btn.btn-secondary type="button" id="clear-filters" { "Clear All" }
                    }
                }
                div.date-range {
                    label for="filter-date-from" { "From" }
                    input.filter-date type="date" id="filter-date-from" data-filter="dateFrom"
                        value=(self.controls.date_from);
                    label for="filter-date-to" { "To" }
                    input.filter-date type="date" id="filter-date-to" data-filter="dateTo"
                        value=(self.controls.date_to);
                }
                @if let Some(tags) = self.options.tags.as_ref().filter(|t| !t.is_empty()) {
                    div.tags-filter {
                        h4 { "Filter by Tags:" }
                        div.tags-grid {
                            @for tag in tags {
                                label.tag-checkbox {
                                    input type="checkbox" value=(tag) data-filter="tags"
                                        checked[self.controls.checked_tags.contains(tag)];
                                    span.tag { (tag) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn facet_select(&self, descriptor: &FacetDescriptor, options: &[String]) -> Markup {
        let id = format!("filter-{}", descriptor.key);
        let selected = self.controls.selects.get(&descriptor.facet);
        html! {
            div.filter-group {
                label for=(id) { (descriptor.label) }
                select.filter-select id=(id) data-filter=(descriptor.key) {
                    option value=(ALL) selected[selected.is_none()] { (descriptor.all_label) }
                    @for option in options {
                        option value=(option) selected[selected == Some(option)] { (option) }
                    }
                }
            }
        }
    }

    fn sort_select(&self) -> Markup {
        html! {
            div.filter-group {
                label for="sort-select" { "Sort By" }
                select.filter-select id="sort-select" {
                    @for option in SortOption::ALL {
                        option value=(option.value()) selected[option == self.controls.sort] {
                            (option.label())
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> FilterOptions {
        FilterOptions {
            tags: Some(vec!["co-op".into(), "cozy".into(), "horror".into()]),
            statuses: Some(vec!["beta".into(), "released".into()]),
            platforms: Some(vec!["PC".into(), "Switch".into()]),
            ..Default::default()
        }
    }

    /// Listener that records every emitted state.
    fn recorder(log: &mut Vec<FilterState>) -> impl FnMut(&FilterState, &mut Document) + '_ {
        move |state: &FilterState, _doc: &mut Document| log.push(state.clone())
    }

    fn setup(query: &str) -> (Filters, Document, Vec<FilterState>) {
        let mut doc = Document::with_containers(["#filters"]);
        doc.set_query(query);
        let mut filters = Filters::new("#filters");
        let mut log = Vec::new();
        filters.init(options(), &mut doc, &mut recorder(&mut log));
        (filters, doc, log)
    }

    // =========================================================================
    // sentinel / facets
    // =========================================================================

    #[test]
    fn sentinel_and_blank_are_inactive() {
        assert!(!is_active_filter_value(None));
        assert!(!is_active_filter_value(Some("")));
        assert!(!is_active_filter_value(Some("  ")));
        assert!(!is_active_filter_value(Some("all")));
        assert!(is_active_filter_value(Some("beta")));
    }

    #[test]
    fn facet_table_is_indexed_by_discriminant() {
        for (i, d) in FACETS.iter().enumerate() {
            assert_eq!(d.facet as usize, i);
            assert_eq!(Facet::from_key(d.key), Some(d.facet));
        }
    }

    #[test]
    fn sort_option_parts() {
        assert_eq!(SortOption::TitleAsc.sort_by(), "title");
        assert_eq!(SortOption::TitleAsc.order(), SortOrder::Asc);
        assert_eq!(SortOption::DateDesc.order(), SortOrder::Desc);
        assert_eq!(
            SortOption::from_parts("status", SortOrder::Asc),
            Some(SortOption::StatusAsc)
        );
        assert_eq!(SortOption::from_parts("status", SortOrder::Desc), None);
        assert_eq!(SortOption::from_value("date-asc"), Some(SortOption::DateAsc));
    }

    // =========================================================================
    // URL round trip
    // =========================================================================

    #[test]
    fn query_string_round_trip() {
        let state = FilterState {
            query: Some("sky & sea".into()),
            tags: vec!["co-op".into(), "cozy".into()],
            status: Some("beta".into()),
            genre: Some("Puzzle".into()),
            platform: Some("PC".into()),
            role: Some("Artist".into()),
            competition: Some("Jam 2024".into()),
            date_from: Some("2024-01-01".into()),
            date_to: Some("2024-12-31".into()),
            sort_by: Some("title".into()),
            sort_order: Some(SortOrder::Asc),
        };
        let encoded = state.to_query_string();
        assert_eq!(FilterState::from_query_string(&encoded), state);
    }

    #[test]
    fn query_string_omits_inactive_values() {
        let state = FilterState {
            query: Some("  ".into()),
            status: Some("all".into()),
            genre: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(state.to_query_string(), "");
    }

    #[test]
    fn query_string_repeats_tags() {
        let state = FilterState {
            tags: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        assert_eq!(state.to_query_string(), "tags=a&tags=b");
    }

    #[test]
    fn from_query_string_ignores_unknown_and_bad_order() {
        let state = FilterState::from_query_string("?foo=bar&sortOrder=sideways&status=");
        assert!(state.is_empty());
    }

    #[test]
    fn filter_state_json_is_camel_case() {
        let state = FilterState {
            date_from: Some("2024-01-01".into()),
            sort_order: Some(SortOrder::Desc),
            ..Default::default()
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "dateFrom": "2024-01-01", "sortOrder": "desc" })
        );
    }

    // =========================================================================
    // init / URL loading
    // =========================================================================

    #[test]
    fn init_without_params_does_not_emit() {
        let (_, doc, log) = setup("");
        assert!(log.is_empty());
        assert_eq!(doc.query(), "");
    }

    #[test]
    fn init_with_params_restores_controls_and_emits() {
        let (filters, doc, log) = setup("status=beta&tags=cozy&query=moss&sortBy=title&sortOrder=asc");
        assert_eq!(log.len(), 1);
        let state = &log[0];
        assert_eq!(state.status.as_deref(), Some("beta"));
        assert_eq!(state.tags, vec!["cozy"]);
        assert_eq!(state.query.as_deref(), Some("moss"));
        assert_eq!(state.sort_by.as_deref(), Some("title"));
        assert_eq!(state.sort_order, Some(SortOrder::Asc));
        assert_eq!(filters.current(), state);
        assert_eq!(FilterState::from_query_string(doc.query()), *state);
    }

    #[test]
    fn init_ignores_values_without_controls() {
        let (_, _, log) = setup("status=cancelled&tags=unknown");
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].status, None);
        assert!(log[0].tags.is_empty());
    }

    #[test]
    fn unmatched_sort_keeps_default() {
        let (_, _, log) = setup("sortBy=rank");
        assert_eq!(log[0].sort_by.as_deref(), Some("date"));
        assert_eq!(log[0].sort_order, Some(SortOrder::Desc));
    }

    // =========================================================================
    // events
    // =========================================================================

    #[test]
    fn select_emits_immediately_and_updates_url() {
        let (mut filters, mut doc, mut log) = setup("");
        filters.handle(
            ControlEvent::SelectFacet {
                facet: Facet::Status,
                value: "released".into(),
            },
            &mut doc,
            &mut recorder(&mut log),
        );
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].status.as_deref(), Some("released"));
        assert_eq!(doc.query(), "status=released&sortBy=date&sortOrder=desc");
    }

    #[test]
    fn selecting_sentinel_clears_facet() {
        let (mut filters, mut doc, mut log) = setup("status=beta");
        filters.handle(
            ControlEvent::SelectFacet {
                facet: Facet::Status,
                value: ALL.into(),
            },
            &mut doc,
            &mut recorder(&mut log),
        );
        assert_eq!(log.last().unwrap().status, None);
        assert!(!doc.query().contains("status"));
    }

    #[test]
    fn search_input_is_debounced() {
        let (mut filters, mut doc, mut log) = setup("");
        let t0 = Instant::now();
        let mut listener = recorder(&mut log);
        for (i, text) in ["m", "mo", "mos"].into_iter().enumerate() {
            filters.handle(
                ControlEvent::SearchInput {
                    text: text.into(),
                    at: t0 + Duration::from_millis(100 * i as u64),
                },
                &mut doc,
                &mut listener,
            );
        }
        filters.handle(
            ControlEvent::Tick(t0 + Duration::from_millis(450)),
            &mut doc,
            &mut listener,
        );
        filters.handle(
            ControlEvent::Tick(t0 + Duration::from_millis(500)),
            &mut doc,
            &mut listener,
        );
        filters.handle(
            ControlEvent::Tick(t0 + Duration::from_millis(900)),
            &mut doc,
            &mut listener,
        );
        drop(listener);
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].query.as_deref(), Some("mos"));
    }

    #[test]
    fn submit_applies_immediately_and_cancels_debounce() {
        let (mut filters, mut doc, mut log) = setup("");
        let t0 = Instant::now();
        let mut listener = recorder(&mut log);
        filters.handle(
            ControlEvent::SearchInput {
                text: "deep".into(),
                at: t0,
            },
            &mut doc,
            &mut listener,
        );
        filters.handle(ControlEvent::SubmitSearch, &mut doc, &mut listener);
        filters.handle(
            ControlEvent::Tick(t0 + Duration::from_secs(1)),
            &mut doc,
            &mut listener,
        );
        drop(listener);
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].query.as_deref(), Some("deep"));
    }

    #[test]
    fn tags_follow_checkbox_order() {
        let (mut filters, mut doc, mut log) = setup("");
        let mut listener = recorder(&mut log);
        for tag in ["horror", "co-op"] {
            filters.handle(
                ControlEvent::ToggleTag {
                    tag: tag.into(),
                    checked: true,
                },
                &mut doc,
                &mut listener,
            );
        }
        filters.handle(
            ControlEvent::ToggleTag {
                tag: "horror".into(),
                checked: false,
            },
            &mut doc,
            &mut listener,
        );
        drop(listener);
        assert_eq!(log[1].tags, vec!["co-op", "horror"]);
        assert_eq!(log[2].tags, vec!["co-op"]);
    }

    #[test]
    fn sort_and_date_range_events() {
        let (mut filters, mut doc, mut log) = setup("");
        let mut listener = recorder(&mut log);
        filters.handle(
            ControlEvent::SelectSort("title-desc".into()),
            &mut doc,
            &mut listener,
        );
        filters.handle(
            ControlEvent::DateRange {
                from: Some("2024-01-01".into()),
                to: None,
            },
            &mut doc,
            &mut listener,
        );
        drop(listener);
        assert_eq!(log[0].sort_by.as_deref(), Some("title"));
        assert_eq!(log[0].sort_order, Some(SortOrder::Desc));
        assert_eq!(log[1].date_from.as_deref(), Some("2024-01-01"));
        assert_eq!(log[1].date_to, None);
    }

    #[test]
    fn clear_all_resets_everything_and_emits_empty_state() {
        let (mut filters, mut doc, mut log) = setup("status=beta&tags=cozy&query=x");
        filters.handle(ControlEvent::ClearAll, &mut doc, &mut recorder(&mut log));
        assert_eq!(log.len(), 2);
        assert!(log[1].is_empty());
        assert_eq!(doc.query(), "");
        assert_eq!(filters.active_filter_count(), 0);
        let html = doc.container("#filters").unwrap();
        assert!(!html.contains("checked"));
    }

    #[test]
    fn active_filter_count_counts_each_tag() {
        let (filters, _, _) = setup("status=beta&tags=cozy&tags=co-op&query=x&dateFrom=2024-01-01");
        assert_eq!(filters.active_filter_count(), 5);
    }

    #[test]
    fn update_options_drops_stale_selections() {
        let (mut filters, mut doc, _) = setup("status=beta&tags=cozy");
        filters.update_options(
            FilterOptions {
                tags: Some(vec!["cozy".into()]),
                ..Default::default()
            },
            &mut doc,
        );
        let state = filters.active_filters();
        assert_eq!(state.status, None);
        assert_eq!(state.tags, vec!["cozy"]);
    }

    // =========================================================================
    // rendering
    // =========================================================================

    #[test]
    fn render_builds_controls_for_present_facets_only() {
        let (_, doc, _) = setup("");
        let html = doc.container("#filters").unwrap();
        assert!(html.contains(r#"id="filter-status""#));
        assert!(html.contains(r#"id="filter-platform""#));
        assert!(!html.contains(r#"id="filter-genre""#));
        assert!(html.contains("All Statuses"));
        assert!(html.contains(r#"id="sort-select""#));
        assert!(html.contains("Clear All"));
        assert!(html.contains("tags-grid"));
    }

    #[test]
    fn render_omits_tag_grid_without_tags() {
        let mut doc = Document::with_containers(["#filters"]);
        let mut filters = Filters::new("#filters");
        filters.init(
            FilterOptions::default(),
            &mut doc,
            &mut |_: &FilterState, _: &mut Document| {},
        );
        let html = doc.container("#filters").unwrap();
        assert!(!html.contains("tags-grid"));
        assert!(!html.contains("filter-status"));
        assert!(html.contains("Date (Newest)"));
    }

    #[test]
    fn render_reflects_selection() {
        let (_, doc, _) = setup("status=beta&tags=cozy&sortBy=title&sortOrder=asc");
        let html = doc.container("#filters").unwrap();
        assert!(html.contains(r#"<option value="beta" selected>beta</option>"#));
        assert!(html.contains(r#"<option value="title-asc" selected>"#));
        assert!(html.contains(r#"value="cozy" data-filter="tags" checked"#));
    }

    #[test]
    fn missing_container_does_not_panic() {
        let mut doc = Document::new();
        let mut filters = Filters::new("#filters");
        let mut log = Vec::new();
        doc.set_query("status=beta");
        filters.init(options(), &mut doc, &mut recorder(&mut log));
        assert_eq!(log.len(), 1);
    }
}
