//! Web search through the unlocking API.
//!
//! The adapter renders a search-engine result page URL, asks the unlocking API
//! for it as markdown, and pulls every URL out of the returned text. Failures
//! never escape: they land in [`SearchResult::error`].
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use unblock_common::{Result, UnblockError};
use unblock_config::UnblockConfig;
use unblock_http::{HttpError, TextResponse};

use crate::engine::SearchEngine;
use crate::markdown::{extract_urls, preview};
use crate::unlocker::UnlockerClient;

pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Falls back to the adapter's configured engine.
    #[serde(default)]
    pub engine: Option<SearchEngine>,
    /// Advisory only; the unlocking API has no result-count knob.
    #[serde(default)]
    pub max_results: Option<u32>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            engine: None,
            max_results: None,
        }
    }

    pub fn with_engine(mut self, engine: SearchEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub raw_markdown: String,
    pub extracted_urls: Vec<String>,
    pub engine: String,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResult {
    fn failed(engine: SearchEngine, query: &str, error: &UnblockError) -> Self {
        Self {
            raw_markdown: String::new(),
            extracted_urls: Vec::new(),
            engine: engine.as_str().to_string(),
            query: query.to_string(),
            error: Some(error.to_string()),
        }
    }

    fn from_markdown(engine: SearchEngine, query: &str, markdown: String) -> Self {
        if markdown.trim().is_empty() {
            return Self::failed(engine, query, &UnblockError::EmptyResult);
        }
        Self {
            extracted_urls: extract_urls(&markdown),
            raw_markdown: markdown,
            engine: engine.as_str().to_string(),
            query: query.to_string(),
            error: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// First extracted URL, or `""` when there is none.
    pub fn primary_url(&self) -> &str {
        self.extracted_urls.first().map(String::as_str).unwrap_or("")
    }

    pub fn envelope(&self) -> SearchEnvelope {
        match &self.error {
            Some(error) => SearchEnvelope::failed(error.clone()),
            None => SearchEnvelope::Found {
                results: vec![PrimaryResult {
                    url: self.primary_url().to_string(),
                }],
                urls: self.extracted_urls.clone(),
                markdown: self.raw_markdown.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryResult {
    pub url: String,
}

/// The JSON shape handed to tool consumers.
///
/// `results` always carries a single entry on success. Older consumers read
/// only `results[0].url`; `urls` is the complete list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchEnvelope {
    Found {
        results: Vec<PrimaryResult>,
        urls: Vec<String>,
        markdown: String,
    },
    Failed {
        error: String,
        results: Vec<PrimaryResult>,
    },
}

impl SearchEnvelope {
    pub fn failed(error: impl Into<String>) -> Self {
        SearchEnvelope::Failed {
            error: error.into(),
            results: Vec::new(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "search.envelope.serialize_failed");
            r#"{"error":"failed to serialize search results","results":[]}"#.to_string()
        })
    }
}

#[derive(Debug, Clone)]
pub struct SearchAdapter {
    unlocker: UnlockerClient,
    default_engine: SearchEngine,
    default_max_results: u32,
    timeout: Duration,
}

impl SearchAdapter {
    /// Build from configuration; fails only on missing/invalid credentials.
    pub fn new(config: &UnblockConfig) -> Result<Self> {
        let unlocker = UnlockerClient::new(&config.unlocker)?;
        Ok(Self::from_unlocker(
            unlocker,
            SearchEngine::from_name(&config.search.engine),
            config.search.max_results,
        ))
    }

    pub fn from_unlocker(
        unlocker: UnlockerClient,
        default_engine: SearchEngine,
        default_max_results: u32,
    ) -> Self {
        Self {
            unlocker,
            default_engine,
            default_max_results,
            timeout: SEARCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn default_engine(&self) -> SearchEngine {
        self.default_engine
    }

    /// Run a search on the calling thread.
    pub fn search(&self, request: &SearchRequest) -> SearchResult {
        let engine = self.engine_for(request);
        let target = self.start(request, engine);
        let started = Instant::now();
        let outcome = self.unlocker.fetch_markdown_blocking(&target, self.timeout);
        self.settle(request, engine, outcome, started)
    }

    /// Same contract as [`SearchAdapter::search`]; suspends only on the network call.
    pub async fn search_async(&self, request: &SearchRequest) -> SearchResult {
        let engine = self.engine_for(request);
        let target = self.start(request, engine);
        let started = Instant::now();
        let outcome = self.unlocker.fetch_markdown(&target, self.timeout).await;
        self.settle(request, engine, outcome, started)
    }

    fn engine_for(&self, request: &SearchRequest) -> SearchEngine {
        request.engine.unwrap_or(self.default_engine)
    }

    fn start(&self, request: &SearchRequest, engine: SearchEngine) -> String {
        let target = engine.search_url(&request.query);
        tracing::info!(
            target: "web.search",
            engine = %engine,
            query = %preview(&request.query, 160),
            max_results = request.max_results.unwrap_or(self.default_max_results),
            zone = %self.unlocker.zone(),
            "search.start"
        );
        target
    }

    fn settle(
        &self,
        request: &SearchRequest,
        engine: SearchEngine,
        outcome: std::result::Result<TextResponse, HttpError>,
        started: Instant,
    ) -> SearchResult {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let markdown = match outcome.map_err(|e| {
            tracing::warn!(
                target: "web.search",
                engine = %engine,
                elapsed_ms,
                status = e.status().map(|s| s.as_u16()),
                error = %e,
                "search.error"
            );
            UnblockError::Transport(e.to_string())
        }) {
            Ok(resp) => resp.body,
            Err(err) => return SearchResult::failed(engine, &request.query, &err),
        };

        let result = SearchResult::from_markdown(engine, &request.query, markdown);
        if result.is_ok() {
            tracing::info!(
                target: "web.search",
                engine = %engine,
                elapsed_ms,
                markdown_len = result.raw_markdown.len(),
                url_count = result.extracted_urls.len(),
                "search.success"
            );
        } else {
            tracing::warn!(target: "web.search", engine = %engine, elapsed_ms, "search.empty");
        }
        result
    }
}
