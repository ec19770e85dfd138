//! End-to-end: build the fixture site, then browse its generated listing
//! data the way a visitor would.

use atlas_site::config::load_config;
use atlas_site::document::Document;
use atlas_site::filters::{ControlEvent, Facet};
use atlas_site::generate::{build, check};
use atlas_site::listing::{JsonFileSource, ListingConfig, ListingLoader, LoadState};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

fn fixture_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    for entry in WalkDir::new(&fixtures) {
        let entry = entry.unwrap();
        let target = tmp.path().join(entry.path().strip_prefix(&fixtures).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
    tmp
}

fn page(query: &str) -> Document {
    let mut doc = Document::with_containers(["#listing", "#filters", "#results-count"]);
    doc.set_query(query);
    doc
}

#[test]
fn built_site_serves_filterable_listing() {
    let site = fixture_site();
    let dist = site.path().join("dist");
    let config = load_config(site.path()).unwrap();
    build(site.path(), &dist, &config).unwrap();

    let source = JsonFileSource::new(dist.join("data/games.json"));
    let mut loader = ListingLoader::new(source, ListingConfig::default());
    let mut doc = page("");
    assert_eq!(loader.init(&mut doc), &LoadState::Ready);
    assert_eq!(loader.data().len(), 2);

    loader.handle(
        ControlEvent::SelectFacet {
            facet: Facet::Status,
            value: "beta".into(),
        },
        &mut doc,
    );
    assert_eq!(doc.query(), "status=beta&sortBy=date&sortOrder=desc");
    let shown: Vec<&str> = loader
        .filtered_data()
        .iter()
        .map(|r| r.title.as_str())
        .collect();
    assert_eq!(shown, vec!["Deep Signal"]);
    assert!(doc.container("#listing").unwrap().contains("game/deep-signal.html"));
    assert_eq!(
        doc.container("#results-count").unwrap(),
        "Showing 1-1 of 1 results"
    );

    // the linked detail page exists
    assert!(dist.join("game/deep-signal.html").is_file());
}

#[test]
fn shared_url_restores_filters() {
    let site = fixture_site();
    let dist = site.path().join("dist");
    let config = load_config(site.path()).unwrap();
    build(site.path(), &dist, &config).unwrap();

    let source = JsonFileSource::new(dist.join("data/games.json"));
    let mut loader = ListingLoader::new(source, ListingConfig::default());
    let mut doc = page("?tags=co-op&platform=Switch");
    loader.init(&mut doc);

    let shown: Vec<&str> = loader
        .filtered_data()
        .iter()
        .map(|r| r.title.as_str())
        .collect();
    assert_eq!(shown, vec!["Skyward"]);
    let filters = doc.container("#filters").unwrap();
    assert!(filters.contains(r#"value="co-op" data-filter="tags" checked"#));
}

#[test]
fn missing_data_file_shows_error() {
    let site = fixture_site();
    let source = JsonFileSource::new(site.path().join("dist/data/games.json"));
    let mut loader = ListingLoader::new(source, ListingConfig::default());
    let mut doc = page("");
    assert!(matches!(loader.init(&mut doc), LoadState::Error(_)));
    assert!(doc.container("#listing").unwrap().contains("Failed to load data"));
}

#[test]
fn check_reports_missing_listing_pages() {
    let site = fixture_site();
    let config = load_config(site.path()).unwrap();
    let report = check(site.path(), &config).unwrap();
    assert_eq!(report.missing_pages, vec!["team.html", "awards.html"]);
    assert!(report.issues.is_empty());
}
