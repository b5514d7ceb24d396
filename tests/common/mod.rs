#![allow(dead_code)]
use async_trait::async_trait;
use chart_export::{Catalog, PageFetcher, Result, ScrapeError, Scraper};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const BEATPORT_DEEP_HOUSE: &str = "https://www.beatport.com/genre/deep-house/12/top-100";
pub const TRAXSOURCE_DEEP_HOUSE: &str =
    "https://www.traxsource.com/genre/71/deep-house/top-100-tracks";
pub const TRACKLIST_SEARCH_CARL_COX: &str =
    "https://www.1001tracklists.com/search/result.php?format=list&limit=50&search=carl%20cox";
pub const TRACKLIST_PAGE: &str =
    "https://www.1001tracklists.com/tracklist/2abc/carl-cox-space-ibiza-closing-party-2016-10-02.html";

/// Read a saved page from `tests/fixtures`.
pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
}

/// Fetcher serving canned pages. Unknown URLs fail like an HTTP 404.
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    /// Every page the fixtures know about.
    pub fn with_fixtures() -> Self {
        Self::new()
            .with_page(BEATPORT_DEEP_HOUSE, fixture("beatport_chart.html"))
            .with_page(TRAXSOURCE_DEEP_HOUSE, fixture("traxsource_chart.html"))
            .with_page(TRACKLIST_SEARCH_CARL_COX, fixture("tracklist_search.html"))
            .with_page(TRACKLIST_PAGE, fixture("tracklist_page.html"))
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::Http(format!("HTTP 404 fetching {url}")))
    }
}

/// Fetcher whose every request times out.
pub struct TimeoutFetcher;

#[async_trait]
impl PageFetcher for TimeoutFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        Err(ScrapeError::Timeout {
            url: url.to_string(),
            secs: 45,
        })
    }
}

pub fn scraper(fetcher: impl PageFetcher + 'static, downloads: &Path) -> Scraper {
    Scraper::new(Arc::new(fetcher), Arc::new(Catalog::builtin()), downloads)
}
