//! End-to-end scrape requests: fetch, parse, normalize, assemble, export.
//!
//! Each request is independent. The scraper only holds immutable shared
//! state (fetcher, catalog, generator), so one instance serves concurrent
//! requests.

use scraper::Html;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assemble::Assembler;
use crate::catalog::{Catalog, SearchType};
use crate::export::export;
use crate::fetcher::PageFetcher;
use crate::normalize::{normalize, FieldRules};
use crate::parsing::ChartParser;
use crate::synthetic::{SampleGenerator, SyntheticRecordGenerator};
use crate::types::{ExportArtifact, NamingParams, Platform, ResultSet};
use crate::{Result, ScrapeError};

/// Bound on the tracks read from a single tracklist page.
pub const TRACKLIST_TRACKS_MAX: usize = 100;

/// Per-request overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrapeOptions {
    /// Replace upstream failures and empty extractions with synthetic
    /// records. `None` uses the scraper's configured default.
    pub synthetic_fallback: Option<bool>,
}

/// A completed scrape and its export.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub platform: Platform,
    /// Genre id, search term or search type
    pub category: String,
    pub result_set: ResultSet,
    pub artifact: ExportArtifact,
}

impl ScrapeOutcome {
    pub fn is_synthetic(&self) -> bool {
        self.result_set.provenance().is_synthetic()
    }
}

/// Outcome for one genre of a multi-genre request.
#[derive(Debug)]
pub struct GenreOutcome {
    pub genre: String,
    pub result: Result<ScrapeOutcome>,
}

/// Summary of a multi-genre request, for reporting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreSummary {
    pub genre: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&GenreOutcome> for GenreSummary {
    fn from(outcome: &GenreOutcome) -> Self {
        match &outcome.result {
            Ok(done) => Self {
                genre: outcome.genre.clone(),
                success: true,
                file_name: Some(done.artifact.file_name.clone()),
                records_count: Some(done.result_set.len()),
                error: None,
            },
            Err(e) => Self {
                genre: outcome.genre.clone(),
                success: false,
                file_name: None,
                records_count: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Runs scrape requests against a [`PageFetcher`].
///
/// # Examples
///
/// ```rust,no_run
/// use chart_export::{Catalog, HttpPageFetcher, Platform, Scraper};
/// use std::sync::Arc;
///
/// # async fn run() -> chart_export::Result<()> {
/// let fetcher = HttpPageFetcher::new(Box::new(http_client::native::NativeClient::new()));
/// let scraper = Scraper::new(Arc::new(fetcher), Arc::new(Catalog::builtin()), "downloads");
///
/// let outcome = scraper.scrape_chart(Platform::Beatport, "techno").await?;
/// println!("{} records in {}", outcome.result_set.len(), outcome.artifact.path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Scraper {
    fetcher: Arc<dyn PageFetcher>,
    catalog: Arc<Catalog>,
    generator: Arc<dyn SyntheticRecordGenerator>,
    parser: ChartParser,
    downloads_root: PathBuf,
    synthetic_fallback: bool,
}

impl Scraper {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        catalog: Arc<Catalog>,
        downloads_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            catalog,
            generator: Arc::new(SampleGenerator::new()),
            parser: ChartParser::new(),
            downloads_root: downloads_root.into(),
            synthetic_fallback: false,
        }
    }

    /// Enable the synthetic fallback for every request by default.
    pub fn with_synthetic_fallback(mut self, enabled: bool) -> Self {
        self.synthetic_fallback = enabled;
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn SyntheticRecordGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn downloads_root(&self) -> &Path {
        &self.downloads_root
    }

    /// Scrape a genre's top-100 chart and export it as CSV.
    pub async fn scrape_chart(&self, platform: Platform, genre: &str) -> Result<ScrapeOutcome> {
        self.scrape_chart_with(platform, genre, ScrapeOptions::default())
            .await
    }

    pub async fn scrape_chart_with(
        &self,
        platform: Platform,
        genre: &str,
        options: ScrapeOptions,
    ) -> Result<ScrapeOutcome> {
        let entry = self.catalog.chart(platform, genre)?.clone();
        log::info!("Scraping {} chart '{}' from {}", platform, entry.id, entry.url);

        let fetched = self.fetcher.fetch_page(&entry.url).await;
        let result_set = self.extract_or_fallback(
            platform,
            &entry.id,
            &entry.id,
            fetched,
            options,
            |html| self.extract_chart(platform, html, &entry.url, &entry.name),
        )?;

        let naming = NamingParams::today(platform, entry.id.clone());
        self.finish(platform, entry.id, result_set, naming).await
    }

    /// Scrape several genres one after another.
    ///
    /// A failing genre does not stop the others; each gets its own result.
    pub async fn scrape_multiple(
        &self,
        platform: Platform,
        genres: &[String],
        options: ScrapeOptions,
    ) -> Vec<GenreOutcome> {
        let mut outcomes = Vec::with_capacity(genres.len());
        for genre in genres {
            let result = self.scrape_chart_with(platform, genre, options).await;
            if let Err(e) = &result {
                log::warn!("Scraping {platform} '{genre}' failed: {e}");
            }
            outcomes.push(GenreOutcome {
                genre: genre.clone(),
                result,
            });
        }
        outcomes
    }

    /// Search 1001Tracklists and export the matching sets as CSV.
    ///
    /// The export category is the query, or the search type when the
    /// listing needs no query.
    pub async fn search_tracklists(
        &self,
        search_type: SearchType,
        query: Option<&str>,
        options: ScrapeOptions,
    ) -> Result<ScrapeOutcome> {
        let platform = Platform::Tracklists;
        let url = self.catalog.tracklist_search_url(search_type, query)?;
        // Query-less listings get sample DJs rather than the search type.
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty() && search_type.needs_query())
            .unwrap_or("");
        let category = if query.is_empty() {
            search_type.to_string()
        } else {
            query.to_string()
        };
        log::info!("Searching 1001Tracklists ({search_type}) for '{category}'");

        let fetched = self.fetcher.fetch_page(&url).await;
        let result_set =
            self.extract_or_fallback(platform, &category, query, fetched, options, |html| {
                self.extract_chart(platform, html, &url, "")
            })?;

        let naming = NamingParams::today(platform, category.clone());
        self.finish(platform, category, result_set, naming).await
    }

    /// Read the tracks of one tracklist. Nothing is exported.
    ///
    /// The URL must be absolute:
    ///
    /// ```rust
    /// # use chart_export::{Catalog, HttpPageFetcher, ScrapeError, Scraper};
    /// # use std::sync::Arc;
    /// # tokio_test::block_on(async {
    /// let fetcher = HttpPageFetcher::new(Box::new(http_client::native::NativeClient::new()));
    /// let scraper = Scraper::new(Arc::new(fetcher), Arc::new(Catalog::builtin()), "downloads");
    ///
    /// let err = scraper.tracklist_tracks("/tracklist/2abc/set.html").await.unwrap_err();
    /// assert!(matches!(err, ScrapeError::InvalidRequest(_)));
    /// # });
    /// ```
    pub async fn tracklist_tracks(&self, tracklist_url: &str) -> Result<ResultSet> {
        let url = tracklist_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ScrapeError::InvalidRequest(format!(
                "tracklist URL must be absolute: '{tracklist_url}'"
            )));
        }

        let html = self.fetcher.fetch_page(url).await?;
        let result_set = self.extract_tracks(&html);
        if result_set.is_empty() {
            return Err(ScrapeError::NoRecords {
                platform: Platform::Tracklists.slug().to_string(),
                category: url.to_string(),
            });
        }
        log::info!("Read {} tracks from {url}", result_set.len());
        Ok(result_set)
    }

    /// Parse, normalize and assemble a chart or tracklist search page.
    pub fn extract_chart(
        &self,
        platform: Platform,
        html: &str,
        page_url: &str,
        category_name: &str,
    ) -> ResultSet {
        let document = Html::parse_document(html);
        let items = match platform {
            Platform::Beatport => self.parser.parse_beatport_chart(&document, page_url),
            Platform::Traxsource => self.parser.parse_traxsource_chart(&document, page_url),
            Platform::Tracklists => self.parser.parse_tracklist_search(&document, page_url),
        };
        let rules = FieldRules::for_chart(platform, category_name);
        Assembler::for_platform(platform).assemble(items.iter().map(|c| normalize(c, &rules)))
    }

    /// Parse, normalize and assemble the tracks of a tracklist page.
    pub fn extract_tracks(&self, html: &str) -> ResultSet {
        let document = Html::parse_document(html);
        let items = self.parser.parse_tracklist_tracks(&document);
        let rules = FieldRules::for_platform(Platform::Tracklists);
        Assembler::new(Platform::Tracklists, TRACKLIST_TRACKS_MAX)
            .assemble(items.iter().map(|c| normalize(c, &rules)))
    }

    /// `synthetic_seed` is the category handed to the generator when the
    /// fallback applies.
    fn extract_or_fallback<F>(
        &self,
        platform: Platform,
        category: &str,
        synthetic_seed: &str,
        fetched: Result<String>,
        options: ScrapeOptions,
        extract: F,
    ) -> Result<ResultSet>
    where
        F: FnOnce(&str) -> ResultSet,
    {
        let fallback = options.synthetic_fallback.unwrap_or(self.synthetic_fallback);

        let extracted = match fetched {
            Ok(html) => extract(&html),
            Err(e) if e.is_upstream() && fallback => {
                log::warn!("Fetch failed for {platform} '{category}', using synthetic records: {e}");
                return Ok(self.synthetic(platform, synthetic_seed));
            }
            Err(e) => return Err(e),
        };

        if !extracted.is_empty() {
            return Ok(extracted);
        }
        if fallback {
            log::warn!("No records extracted for {platform} '{category}', using synthetic records");
            return Ok(self.synthetic(platform, synthetic_seed));
        }
        Err(ScrapeError::NoRecords {
            platform: platform.slug().to_string(),
            category: category.to_string(),
        })
    }

    fn synthetic(&self, platform: Platform, category: &str) -> ResultSet {
        self.generator
            .generate(platform, category, platform.max_records())
    }

    async fn finish(
        &self,
        platform: Platform,
        category: String,
        result_set: ResultSet,
        naming: NamingParams,
    ) -> Result<ScrapeOutcome> {
        let root = self.downloads_root.clone();
        let (result_set, artifact) = tokio::task::spawn_blocking(move || {
            let artifact = export(&result_set, &naming, &root);
            (result_set, artifact)
        })
        .await
        .map_err(|e| ScrapeError::Io(std::io::Error::other(e.to_string())))?;

        Ok(ScrapeOutcome {
            platform,
            category,
            result_set,
            artifact: artifact?,
        })
    }
}
