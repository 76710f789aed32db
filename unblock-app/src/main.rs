use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use unblock_common::observability::{LogConfig, LogFormat, init_logging};
use unblock_config::{LoggingConfig, UnblockConfig, UnblockConfigLoader, default_config_path};
use unblock_web::{CrawlAdapter, SearchAdapter, SearchEngine, SearchRequest};

/// Web search and page crawl through an unlocking API
#[derive(Parser)]
#[command(name = "unblock", version, about)]
struct Cli {
    /// YAML config file; defaults to the platform config dir when present
    #[arg(short, long, env = "UNBLOCK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the web and print the result envelope as JSON
    Search {
        query: String,
        /// google, bing or yandex
        #[arg(short, long)]
        engine: Option<String>,
        #[arg(long)]
        max_results: Option<u32>,
    },
    /// Fetch one page and print its URL and the start of its content
    Crawl { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // File values beat vendor env vars; UNBLOCK__* beats both.
    let loader = match &cli.config {
        Some(path) => UnblockConfigLoader::new().with_file(path),
        None => match default_config_path() {
            Some(path) => UnblockConfigLoader::new().with_optional_file(path),
            None => UnblockConfigLoader::new(),
        },
    };
    let cfg: UnblockConfig = loader.load().context("loading configuration")?;

    let log_path = init_logging(log_config(&cfg.logging)?)?;
    tracing::debug!(log_path = %log_path.display(), "app.logging_ready");

    match cli.command {
        Command::Search {
            query,
            engine,
            max_results,
        } => {
            let adapter = SearchAdapter::new(&cfg)?;
            let mut request = SearchRequest::new(query);
            if let Some(name) = engine {
                request = request.with_engine(SearchEngine::from_name(&name));
            }
            if let Some(n) = max_results {
                request = request.with_max_results(n);
            }
            let result = adapter.search_async(&request).await;
            println!("{}", result.envelope().to_json());
        }
        Command::Crawl { url } => {
            let adapter = CrawlAdapter::new(&cfg)?;
            let result = adapter.crawl_result(&url).await;
            println!("{}", result.render(adapter.preview_chars()));
        }
    }

    Ok(())
}

fn log_config(logging: &LoggingConfig) -> Result<LogConfig> {
    let format = logging
        .format
        .parse::<LogFormat>()
        .map_err(anyhow::Error::msg)?;
    Ok(LogConfig {
        log_dir: logging.dir.clone(),
        emit_stderr: logging.stderr,
        format,
        default_filter: logging.filter.clone(),
        ..LogConfig::default()
    })
}
