use crate::Result;
use async_trait::async_trait;

/// Source of page HTML for the scraping pipeline.
///
/// The pipeline never talks to the network itself: it asks a fetcher for
/// the markup at a URL and parses what comes back. [`HttpPageFetcher`]
/// is the production implementation; tests supply canned pages.
///
/// Implementations own timeouts and retries. A fetch either returns the
/// full document or one of the upstream errors
/// ([`ScrapeError::Http`](crate::ScrapeError::Http),
/// [`ScrapeError::Timeout`](crate::ScrapeError::Timeout),
/// [`ScrapeError::RateLimit`](crate::ScrapeError::RateLimit)).
///
/// # Mocking Support
///
/// When the `mock` feature is enabled, this crate provides
/// `MockPageFetcher` that implements this trait using the `mockall` library.
///
/// [`HttpPageFetcher`]: crate::HttpPageFetcher
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the HTML document at `url`.
    async fn fetch_page(&self, url: &str) -> Result<String>;
}
