//! Scraper module for fetching HTML content from the target URL
//!
//! This module provides the HTTP client with a fixed browser-like header set
//! and a flat retry policy. Callers get a parsed document or nothing; fetch
//! errors are logged here and never surface past [`Scraper::fetch_document`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::Client;
use scraper::Html;
use thiserror::Error;
use tokio::time::sleep;

/// Errors that can occur during a single fetch attempt
#[derive(Error, Debug)]
pub enum ScraperError {
    /// Network-related errors (connection timeout, DNS failure, etc.)
    #[error("Failed to connect to server: {0}")]
    NetworkError(String),

    /// HTTP status outside 2xx/3xx
    #[error("Server returned status {0}")]
    HttpError(u16),

    /// Error reading response body
    #[error("Failed to read response body: {0}")]
    ResponseError(String),

    /// Rate limited by server
    #[error("Rate limited, retry after delay")]
    RateLimited,

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientError(String),
}

/// Result of a successful page fetch
#[derive(Debug, Clone)]
pub struct ScraperResult {
    /// The HTML content of the page
    pub html: String,
    /// The HTTP status code
    pub status: u16,
}

/// Fetch policy
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Total attempts per URL
    pub max_retries: u32,
    /// Flat delay between failed attempts
    pub retry_delay: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Politeness pause between successive listing pages
    pub page_delay: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(10),
            page_delay: Duration::from_secs(1),
        }
    }
}

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// One GET attempt against a URL, no retries
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn get(&self, url: &str) -> Result<ScraperResult, ScraperError>;
}

/// [`PageSource`] backed by a reqwest client
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Build a client with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScraperError::ClientError(e.to_string()))?;

        Ok(Self { client })
    }
}

impl PageSource for HttpSource {
    async fn get(&self, url: &str) -> Result<ScraperResult, ScraperError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.5")
            .header("Connection", "keep-alive")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScraperError::NetworkError("Connection timeout".to_string())
                } else if e.is_connect() {
                    ScraperError::NetworkError("Failed to connect to server".to_string())
                } else {
                    ScraperError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        let status_code = status.as_u16();

        if status_code == 429 {
            return Err(ScraperError::RateLimited);
        }

        if !(status.is_success() || status.is_redirection()) {
            return Err(ScraperError::HttpError(status_code));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ScraperError::ResponseError(e.to_string()))?;

        Ok(ScraperResult {
            html,
            status: status_code,
        })
    }
}

/// Page fetcher with a flat retry policy
pub struct Scraper<S = HttpSource> {
    source: S,
    config: ScraperConfig,
    request_count: AtomicUsize,
}

impl Scraper<HttpSource> {
    /// Create a new Scraper with default configuration
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_config(ScraperConfig::default())
    }

    /// Create a new Scraper with custom configuration
    pub fn with_config(config: ScraperConfig) -> Result<Self, ScraperError> {
        let source = HttpSource::new(config.request_timeout)?;
        Ok(Self::with_source(source, config))
    }
}

impl<S: PageSource> Scraper<S> {
    /// Create a Scraper over an arbitrary page source
    pub fn with_source(source: S, config: ScraperConfig) -> Self {
        Self {
            source,
            config,
            request_count: AtomicUsize::new(0),
        }
    }

    /// Fetch policy in use
    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Fetch a page, retrying with a flat delay.
    ///
    /// Each failed attempt is logged as a warning; exhausting the budget logs
    /// one error and yields `None`.
    pub async fn fetch_page(&self, url: &str) -> Option<ScraperResult> {
        let attempts = self.config.max_retries.max(1);

        for attempt in 1..=attempts {
            self.request_count.fetch_add(1, Ordering::SeqCst);

            match self.source.get(url).await {
                Ok(result) => return Some(result),
                Err(e) => {
                    tracing::warn!("Attempt {} failed for {}: {}", attempt, url, e);
                    if attempt < attempts {
                        sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        tracing::error!("Failed to fetch {} after {} attempts", url, attempts);
        None
    }

    /// Fetch a page and parse it into a document tree
    pub async fn fetch_document(&self, url: &str) -> Option<Html> {
        let result = self.fetch_page(url).await?;
        tracing::debug!("Fetched {} bytes from {}", result.html.len(), url);
        Some(Html::parse_document(&result.html))
    }

    /// Sleep for the configured politeness delay
    pub async fn pause(&self) {
        sleep(self.config.page_delay).await;
    }

    /// Number of GET attempts issued so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory page source for exercising the fetch and crawl paths.

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::{PageSource, ScraperConfig, ScraperError, ScraperResult};

    /// Serves canned HTML by URL; unknown URLs fail with HTTP 404
    #[derive(Default)]
    pub struct StaticSource {
        pages: HashMap<String, String>,
        failures_before_success: HashMap<String, u32>,
        hits: Mutex<HashMap<String, u32>>,
    }

    impl StaticSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        /// Fail the first `count` requests for `url` with a 503
        pub fn flaky(mut self, url: &str, count: u32) -> Self {
            self.failures_before_success.insert(url.to_string(), count);
            self
        }

        pub fn hits(&self, url: &str) -> u32 {
            self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
        }
    }

    impl PageSource for StaticSource {
        async fn get(&self, url: &str) -> Result<ScraperResult, ScraperError> {
            let hit = {
                let mut hits = self.hits.lock().unwrap();
                let entry = hits.entry(url.to_string()).or_insert(0);
                *entry += 1;
                *entry
            };

            if let Some(&fail) = self.failures_before_success.get(url) {
                if hit <= fail {
                    return Err(ScraperError::HttpError(503));
                }
            }

            match self.pages.get(url) {
                Some(html) => Ok(ScraperResult {
                    html: html.clone(),
                    status: 200,
                }),
                None => Err(ScraperError::HttpError(404)),
            }
        }
    }

    pub fn instant_config() -> ScraperConfig {
        ScraperConfig {
            retry_delay: Duration::ZERO,
            page_delay: Duration::ZERO,
            ..ScraperConfig::default()
        }
    }
}
