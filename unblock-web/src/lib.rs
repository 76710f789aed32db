//! Web search and page crawl over a third-party unlocking API.
//!
//! - [`SearchAdapter`] renders a search-engine URL, fetches it as markdown and
//!   extracts every URL from the page
//! - [`CrawlAdapter`] fetches one arbitrary URL as markdown
//! - [`tools`] wraps both for agent use: JSON arguments in, text out
//!
//! Per-call failures are data. Only construction can fail, and only with
//! [`unblock_common::UnblockError::Config`].

pub mod crawl;
pub mod credentials;
pub mod engine;
pub mod markdown;
pub mod search;
pub mod tools;
pub mod unlocker;

pub use crawl::{CRAWL_TIMEOUT, CrawlAdapter, CrawlRequest, CrawlResult, CrawledPage};
pub use credentials::Credentials;
pub use engine::SearchEngine;
pub use search::{
    PrimaryResult, SEARCH_TIMEOUT, SearchAdapter, SearchEnvelope, SearchRequest, SearchResult,
};
pub use tools::{AgentTool, CrawlTool, SearchTool};
pub use unlocker::UnlockerClient;
pub use unblock_common::UnblockError;
