//! Agent-facing wrappers: JSON arguments in, text out, never an error.
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::crawl::{CrawlAdapter, CrawlRequest, CrawlResult};
use crate::search::{SearchAdapter, SearchEnvelope, SearchRequest};

#[async_trait]
pub trait AgentTool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Run the tool. Failures, including malformed `args`, come back as text.
    async fn call(&self, args: Value) -> String;
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, String> {
    serde_json::from_value(args).map_err(|e| {
        tracing::warn!(target: "web.tool", tool, error = %e, "tool.bad_args");
        format!("invalid arguments: {e}")
    })
}

#[derive(Debug, Clone)]
pub struct SearchTool {
    adapter: SearchAdapter,
}

impl SearchTool {
    pub fn new(adapter: SearchAdapter) -> Self {
        Self { adapter }
    }

    /// Blocking counterpart of [`AgentTool::call`].
    pub fn run(&self, args: Value) -> String {
        match parse_args::<SearchRequest>(self.name(), args) {
            Ok(request) => self.adapter.search(&request).envelope().to_json(),
            Err(error) => SearchEnvelope::failed(error).to_json(),
        }
    }
}

#[async_trait]
impl AgentTool for SearchTool {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> &'static str {
        "Search the web through the unlocking API. Input: {\"query\": string}. \
         Returns JSON with the first result URL, every URL found, and the raw markdown."
    }

    async fn call(&self, args: Value) -> String {
        match parse_args::<SearchRequest>(self.name(), args) {
            Ok(request) => self.adapter.search_async(&request).await.envelope().to_json(),
            Err(error) => SearchEnvelope::failed(error).to_json(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlTool {
    adapter: CrawlAdapter,
}

impl CrawlTool {
    pub fn new(adapter: CrawlAdapter) -> Self {
        Self { adapter }
    }

    pub fn run(&self, args: Value) -> String {
        match parse_args::<CrawlRequest>(self.name(), args) {
            Ok(request) => self
                .adapter
                .crawl_result_blocking(&request.url)
                .render(self.adapter.preview_chars()),
            Err(error) => Self::bad_args(error),
        }
    }

    fn bad_args(error: String) -> String {
        CrawlResult {
            url: String::new(),
            markdown: String::new(),
            error: Some(error),
        }
        .render(0)
    }
}

#[async_trait]
impl AgentTool for CrawlTool {
    fn name(&self) -> &'static str {
        "crawl"
    }

    fn description(&self) -> &'static str {
        "Fetch a single web page through the unlocking API. Input: {\"url\": string}. \
         Returns the URL and the start of the page content as markdown."
    }

    async fn call(&self, args: Value) -> String {
        match parse_args::<CrawlRequest>(self.name(), args) {
            Ok(request) => self
                .adapter
                .crawl_result(&request.url)
                .await
                .render(self.adapter.preview_chars()),
            Err(error) => Self::bad_args(error),
        }
    }
}
