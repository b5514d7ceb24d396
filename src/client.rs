use crate::fetcher::PageFetcher;
use crate::headers::{add_page_headers, add_referer, DEFAULT_USER_AGENT};
use crate::retry::{retry_operation, RetryConfig};
use crate::{Result, ScrapeError};
use async_trait::async_trait;
use http_client::{HttpClient, Request};
use http_types::{Method, Url};
use std::time::Duration;

const MAX_REDIRECTS: u32 = 5;

/// Plain HTTP implementation of [`PageFetcher`].
///
/// Each fetch is bounded by a timeout and retried with backoff on
/// upstream failures. Redirects are followed manually, up to five hops.
///
/// # Examples
///
/// ```rust,no_run
/// use chart_export::{HttpPageFetcher, PageFetcher};
/// use std::time::Duration;
///
/// # async fn run() -> chart_export::Result<()> {
/// let http_client = http_client::native::NativeClient::new();
/// let fetcher = HttpPageFetcher::new(Box::new(http_client))
///     .with_timeout(Duration::from_secs(20));
/// let html = fetcher.fetch_page("https://www.traxsource.com/").await?;
/// # Ok(())
/// # }
/// ```
pub struct HttpPageFetcher {
    client: Box<dyn HttpClient>,
    user_agent: String,
    timeout: Duration,
    retry: RetryConfig,
}

impl HttpPageFetcher {
    /// Create a fetcher with a 45 second timeout and default retries.
    ///
    /// # Arguments
    ///
    /// * `client` - Any HTTP client implementation that implements [`HttpClient`]
    pub fn new(client: Box<dyn HttpClient>) -> Self {
        Self {
            client,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(45),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.get_with_redirects(url)).await {
            Ok(result) => result,
            Err(_) => Err(ScrapeError::Timeout {
                url: url.to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }

    async fn get_with_redirects(&self, url: &str) -> Result<String> {
        let mut current = url
            .parse::<Url>()
            .map_err(|e| ScrapeError::InvalidRequest(format!("invalid URL '{url}': {e}")))?;
        let mut referer: Option<Url> = None;

        for _ in 0..=MAX_REDIRECTS {
            let mut request = Request::new(Method::Get, current.clone());
            add_page_headers(&mut request, &self.user_agent);
            if let Some(referer) = &referer {
                add_referer(&mut request, referer.as_str());
            }

            log::debug!("GET {current}");
            let mut response = self
                .client
                .send(request)
                .await
                .map_err(|e| ScrapeError::Http(e.to_string()))?;

            let status = response.status();
            if status.is_redirection() {
                if let Some(location) = response
                    .header("location")
                    .and_then(|h| h.get(0))
                    .map(|v| v.as_str().to_string())
                {
                    let next = current.join(&location).map_err(|e| {
                        ScrapeError::Http(format!("bad redirect '{location}': {e}"))
                    })?;
                    log::debug!("Following redirect from {current} to {next}");
                    referer = Some(std::mem::replace(&mut current, next));
                    continue;
                }
            }

            if status == 429 {
                let retry_after = response
                    .header("retry-after")
                    .and_then(|h| h.get(0))
                    .and_then(|v| v.as_str().parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(ScrapeError::RateLimit { retry_after });
            }

            if !status.is_success() {
                return Err(ScrapeError::Http(format!(
                    "HTTP {} fetching {current}",
                    u16::from(status)
                )));
            }

            let body = response
                .body_string()
                .await
                .map_err(|e| ScrapeError::Http(e.to_string()))?;
            log::debug!("Fetched {} bytes from {current}", body.len());
            return Ok(body);
        }

        Err(ScrapeError::Http(format!("Too many redirects fetching {url}")))
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let outcome = retry_operation(&self.retry, url, || self.fetch_once(url)).await?;
        if outcome.attempts_made > 0 {
            log::info!(
                "Fetched {url} after {} retries ({}ms waiting)",
                outcome.attempts_made,
                outcome.total_retry_time.as_millis()
            );
        }
        Ok(outcome.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_types::{Error, Response};
    use std::sync::{Arc, Mutex};

    /// Replays canned responses in order and records requested URLs.
    #[derive(Debug, Default)]
    struct ScriptedClient {
        responses: Mutex<Vec<(u16, Vec<(&'static str, &'static str)>, &'static str)>>,
        requested: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl HttpClient for ScriptedClient {
        async fn send(&self, req: Request) -> std::result::Result<Response, Error> {
            self.requested.lock().unwrap().push(req.url().to_string());
            let (status, headers, body) = self.responses.lock().unwrap().remove(0);
            let mut response = Response::new(status);
            for (name, value) in headers {
                response.insert_header(name, value);
            }
            response.set_body(body);
            Ok(response)
        }
    }

    fn fetcher(
        responses: Vec<(u16, Vec<(&'static str, &'static str)>, &'static str)>,
    ) -> (HttpPageFetcher, Arc<Mutex<Vec<String>>>) {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let client = ScriptedClient {
            responses: Mutex::new(responses),
            requested: requested.clone(),
        };
        let fetcher = HttpPageFetcher::new(Box::new(client)).with_retry(RetryConfig {
            max_retries: 1,
            base_delay_ms: 1,
            max_delay_ms: 5,
        });
        (fetcher, requested)
    }

    #[tokio::test]
    async fn returns_body_on_success() {
        let (fetcher, _) = fetcher(vec![(200, vec![], "<html>chart</html>")]);
        let body = fetcher.fetch_page("https://www.traxsource.com/").await.unwrap();
        assert_eq!(body, "<html>chart</html>");
    }

    #[tokio::test]
    async fn follows_relative_redirects() {
        let (fetcher, requested) = fetcher(vec![
            (301, vec![("Location", "/genre/71/deep-house")], ""),
            (200, vec![], "moved"),
        ]);
        let body = fetcher
            .fetch_page("https://www.traxsource.com/old")
            .await
            .unwrap();
        assert_eq!(body, "moved");
        assert_eq!(
            requested.lock().unwrap().last().unwrap(),
            "https://www.traxsource.com/genre/71/deep-house"
        );
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_reported() {
        let (fetcher, requested) = fetcher(vec![(503, vec![], ""), (503, vec![], "")]);
        let err = fetcher
            .fetch_page("https://www.beatport.com/")
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Http(_)));
        assert_eq!(requested.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn rate_limit_then_success() {
        let (fetcher, _) = fetcher(vec![
            (429, vec![("Retry-After", "0")], ""),
            (200, vec![], "ok"),
        ]);
        let body = fetcher.fetch_page("https://www.beatport.com/").await.unwrap();
        assert_eq!(body, "ok");
    }
}
