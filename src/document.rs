//! The page a listing renders into.
//!
//! A [`Document`] stands in for the browser page: a set of render
//! containers addressed by selector, each holding an HTML subtree, plus the
//! page's current URL query string. Components own the subtree of the
//! container they were given and replace it wholesale on every render.
//!
//! A selector that was never registered is a legitimate state (the page
//! simply has no such section), so writes to it are dropped rather than
//! treated as errors.

use maud::Markup;
use std::collections::BTreeMap;
use tracing::debug;

/// A pending request to bring a container into view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRequest {
    pub selector: String,
    /// Pixels kept clear above the container (fixed header height).
    pub offset: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    containers: BTreeMap<String, String>,
    query: String,
    scroll: Option<ScrollRequest>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document with empty containers for each selector.
    pub fn with_containers<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut doc = Self::new();
        for selector in selectors {
            doc.add_container(selector);
        }
        doc
    }

    pub fn add_container(&mut self, selector: impl Into<String>) {
        self.containers.entry(selector.into()).or_default();
    }

    pub fn has_container(&self, selector: &str) -> bool {
        self.containers.contains_key(selector)
    }

    /// Current HTML of a container, `None` if the page has no such container.
    pub fn container(&self, selector: &str) -> Option<&str> {
        self.containers.get(selector).map(String::as_str)
    }

    /// Replace a container's subtree. Returns false (and changes nothing)
    /// when the container does not exist.
    pub fn replace(&mut self, selector: &str, markup: Markup) -> bool {
        match self.containers.get_mut(selector) {
            Some(slot) => {
                *slot = markup.into_string();
                true
            }
            None => {
                debug!(selector, "render target missing, skipping");
                false
            }
        }
    }

    /// URL query string without the leading `?`.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replace the URL query string in place (no navigation).
    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        self.query = query.strip_prefix('?').map(str::to_string).unwrap_or(query);
    }

    pub fn scroll_into_view(&mut self, selector: &str, offset: u32) {
        if self.has_container(selector) {
            self.scroll = Some(ScrollRequest {
                selector: selector.to_string(),
                offset,
            });
        }
    }

    /// Take the pending scroll request, if any.
    pub fn take_scroll(&mut self) -> Option<ScrollRequest> {
        self.scroll.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maud::html;

    #[test]
    fn replace_writes_registered_container() {
        let mut doc = Document::with_containers(["#listing"]);
        assert!(doc.replace("#listing", html! { p { "hi" } }));
        assert_eq!(doc.container("#listing"), Some("<p>hi</p>"));
    }

    #[test]
    fn replace_missing_container_is_noop() {
        let mut doc = Document::new();
        assert!(!doc.replace("#listing", html! { p { "hi" } }));
        assert_eq!(doc.container("#listing"), None);
    }

    #[test]
    fn replace_overwrites_previous_subtree() {
        let mut doc = Document::with_containers(["#a"]);
        doc.replace("#a", html! { "one" });
        doc.replace("#a", html! { "two" });
        assert_eq!(doc.container("#a"), Some("two"));
    }

    #[test]
    fn set_query_strips_question_mark() {
        let mut doc = Document::new();
        doc.set_query("?status=beta");
        assert_eq!(doc.query(), "status=beta");
    }

    #[test]
    fn scroll_request_only_for_known_containers() {
        let mut doc = Document::with_containers(["#listing"]);
        doc.scroll_into_view("#missing", 100);
        assert_eq!(doc.take_scroll(), None);

        doc.scroll_into_view("#listing", 100);
        assert_eq!(
            doc.take_scroll(),
            Some(ScrollRequest {
                selector: "#listing".into(),
                offset: 100
            })
        );
        assert_eq!(doc.take_scroll(), None);
    }
}
