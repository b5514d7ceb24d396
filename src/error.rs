use thiserror::Error;

/// Error types for chart scraping and export.
///
/// Missing or malformed individual fields are never errors: the field
/// extractor absorbs them as sentinel values. This enum only covers the
/// structural failures that reach the request boundary.
///
/// # Error Handling Examples
///
/// ```rust,no_run
/// use chart_export::{Platform, ScrapeError, Scraper};
///
/// # async fn run(scraper: &Scraper) {
/// match scraper.scrape_chart(Platform::Traxsource, "deep-house").await {
///     Ok(outcome) => println!("wrote {}", outcome.artifact.file_name),
///     Err(ScrapeError::NoRecords { .. }) => eprintln!("nothing extracted, try another genre"),
///     Err(e) if e.is_upstream() => eprintln!("source site unavailable: {e}"),
///     Err(e) => eprintln!("export failed: {e}"),
/// }
/// # }
/// ```
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// HTTP/network related errors while fetching a source page.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The page fetch did not complete within the configured time.
    #[error("Timed out after {secs} seconds fetching {url}")]
    Timeout {
        /// The URL being fetched
        url: String,
        /// Configured timeout in seconds
        secs: u64,
    },

    /// The source site asked us to slow down.
    ///
    /// The `retry_after` field indicates how many seconds to wait before
    /// the next request attempt.
    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimit {
        /// Number of seconds to wait before retrying
        retry_after: u64,
    },

    /// Extraction produced zero usable records.
    ///
    /// Not fatal: the query simply has no data. Callers report it as
    /// "not found" and may retry with different parameters.
    #[error("No records extracted for {platform} '{category}'")]
    NoRecords {
        /// Platform slug
        platform: String,
        /// Genre, search term or tracklist URL that was queried
        category: String,
    },

    /// The platform slug is not one we know how to scrape.
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    /// The genre or search type is not in the catalog for the platform.
    #[error("Unknown category '{category}' for {platform}")]
    UnknownCategory {
        /// Platform slug
        platform: String,
        /// The rejected genre or search type
        category: String,
    },

    /// A request was malformed (missing query, bad URL, bad file name).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A requested export file does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// File system I/O errors while writing or listing exports.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization errors.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ScrapeError {
    /// Whether the error came from the page-fetch collaborator.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ScrapeError::Http(_) | ScrapeError::Timeout { .. } | ScrapeError::RateLimit { .. }
        )
    }

    /// Whether retrying the same fetch could succeed.
    pub fn is_retryable(&self) -> bool {
        self.is_upstream()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_are_retryable() {
        assert!(ScrapeError::Http("connection reset".to_string()).is_retryable());
        assert!(ScrapeError::RateLimit { retry_after: 5 }.is_retryable());
        assert!(ScrapeError::Timeout {
            url: "https://example.com".to_string(),
            secs: 45
        }
        .is_upstream());
    }

    #[test]
    fn export_errors_are_not_retryable() {
        let io = ScrapeError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        ));
        assert!(!io.is_retryable());
        assert!(!ScrapeError::NoRecords {
            platform: "beatport".to_string(),
            category: "house".to_string()
        }
        .is_upstream());
    }
}
