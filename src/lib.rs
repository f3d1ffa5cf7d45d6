//! Site-Probe: a concurrent same-origin site crawler
//!
//! This crate walks a site from a start URL under a bounded number of
//! concurrent page visits, collects script, console, request and navigation
//! errors from every page, and lets plugins observe and filter the crawl.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod output;
pub mod plugin;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Probe operations
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Failed to start page fetcher: {0}")]
    FetcherStartup(#[source] FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// Errors raised by a page fetcher or one of its pages
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Timed out after {timeout_ms}ms loading {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Page fetcher has not been started")]
    NotStarted,

    #[error("Page has no loaded document")]
    NoDocument,

    #[error("Fetcher startup failed: {0}")]
    Startup(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Site-Probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use cache::{CachedResource, ResourceCache};
pub use config::Config;
pub use crawler::{Crawler, HttpFetcher, Page, PageFetcher};
pub use output::{CrawlError, CrawlReport, CrawlResult, ErrorKind, ErrorReporter};
pub use plugin::Plugin;
pub use state::{Frontier, VisitedSet, WorkItem};
