//! Single-page crawl through the unlocking API.
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use unblock_common::{Result, UnblockError};
use unblock_config::{DEFAULT_PREVIEW_CHARS, UnblockConfig};
use unblock_http::{HttpError, TextResponse};

use crate::markdown::preview;
use crate::unlocker::UnlockerClient;

pub const CRAWL_TIMEOUT: Duration = Duration::from_secs(120);
const DIAG_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CrawlRequest {
    pub url: String,
}

/// Page content exactly as the unlocking API returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawledPage {
    markdown: String,
}

impl CrawledPage {
    pub fn new(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
        }
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    pub fn into_markdown(self) -> String {
        self.markdown
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlResult {
    pub url: String,
    pub markdown: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrawlResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Text form handed to tool consumers.
    ///
    /// ```
    /// use unblock_web::CrawlResult;
    ///
    /// let ok = CrawlResult {
    ///     url: "https://example.com".into(),
    ///     markdown: "# Example Domain".into(),
    ///     error: None,
    /// };
    /// assert_eq!(ok.render(9), "URL: https://example.com\n\nContent:\n# Example");
    /// ```
    pub fn render(&self, preview_chars: usize) -> String {
        match &self.error {
            Some(cause) => format!("Failed to crawl. Error: {cause}"),
            None => format!(
                "URL: {}\n\nContent:\n{}",
                self.url,
                preview(&self.markdown, preview_chars)
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlAdapter {
    unlocker: UnlockerClient,
    preview_chars: usize,
    timeout: Duration,
}

impl CrawlAdapter {
    pub fn new(config: &UnblockConfig) -> Result<Self> {
        let unlocker = UnlockerClient::new(&config.unlocker)?;
        Ok(Self::from_unlocker(unlocker).with_preview_chars(config.crawl.preview_chars))
    }

    pub fn from_unlocker(unlocker: UnlockerClient) -> Self {
        Self {
            unlocker,
            preview_chars: DEFAULT_PREVIEW_CHARS,
            timeout: CRAWL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Capped at [`DEFAULT_PREVIEW_CHARS`].
    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars.min(DEFAULT_PREVIEW_CHARS);
        self
    }

    pub fn preview_chars(&self) -> usize {
        self.preview_chars
    }

    pub async fn crawl(&self, url: &str) -> Result<CrawledPage> {
        tracing::info!(target: "web.crawl", %url, zone = %self.unlocker.zone(), "crawl.start");
        let started = Instant::now();
        let outcome = self.unlocker.fetch_markdown(url, self.timeout).await;
        Self::finish(url, outcome, started)
    }

    /// Blocking twin of [`CrawlAdapter::crawl`]; keep it off the async executor.
    pub fn crawl_blocking(&self, url: &str) -> Result<CrawledPage> {
        tracing::info!(target: "web.crawl", %url, zone = %self.unlocker.zone(), "crawl.start");
        let started = Instant::now();
        let outcome = self.unlocker.fetch_markdown_blocking(url, self.timeout);
        Self::finish(url, outcome, started)
    }

    pub async fn crawl_result(&self, url: &str) -> CrawlResult {
        Self::to_result(url, self.crawl(url).await)
    }

    pub fn crawl_result_blocking(&self, url: &str) -> CrawlResult {
        Self::to_result(url, self.crawl_blocking(url))
    }

    fn finish(
        url: &str,
        outcome: std::result::Result<TextResponse, HttpError>,
        started: Instant,
    ) -> Result<CrawledPage> {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(TextResponse { status, body }) => {
                tracing::info!(
                    target: "web.crawl",
                    %url,
                    elapsed_ms,
                    status = status.as_u16(),
                    body_len = body.len(),
                    "crawl.success"
                );
                tracing::debug!(
                    target: "web.crawl",
                    %url,
                    head = %preview(&body, DIAG_PREVIEW_CHARS),
                    "crawl.body"
                );
                Ok(CrawledPage::new(body))
            }
            Err(e) => {
                tracing::warn!(
                    target: "web.crawl",
                    %url,
                    elapsed_ms,
                    status = e.status().map(|s| s.as_u16()),
                    error = %e,
                    "crawl.error"
                );
                Err(UnblockError::Crawl(e.to_string()))
            }
        }
    }

    fn to_result(url: &str, outcome: Result<CrawledPage>) -> CrawlResult {
        match outcome {
            Ok(page) => CrawlResult {
                url: url.to_string(),
                markdown: page.into_markdown(),
                error: None,
            },
            Err(e) => CrawlResult {
                url: url.to_string(),
                markdown: String::new(),
                error: Some(e.to_string()),
            },
        }
    }
}
