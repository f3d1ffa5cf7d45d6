//! Crawler module for page visiting and crawl orchestration
//!
//! This module contains the core crawling logic, including:
//! - The page fetcher abstraction and its HTTP implementation
//! - HTML parsing for anchors and sub-resources
//! - Single page visits with error collection (`PageProcessor`)
//! - Bounded-concurrency crawl coordination (`Crawler`)

mod coordinator;
mod fetcher;
mod parser;
mod processor;

#[cfg(test)]
mod test_support;

pub use coordinator::Crawler;
pub use fetcher::{
    build_http_client, ConsoleLevel, HttpFetcher, NavigationResponse, Page, PageContext, PageEvent,
    PageFetcher,
};
pub use parser::{extract_anchor_hrefs, extract_subresources};
pub use processor::{PageProcessor, VisitOutcome, VisitSettings};

use crate::config::Config;
use crate::output::CrawlReport;
use crate::ProbeError;
use std::sync::Arc;

/// Runs a complete crawl with the HTTP page fetcher
///
/// This is the main entry point for probing a site. It will:
/// 1. Validate the configuration
/// 2. Start the HTTP fetcher
/// 3. Visit every same-origin page within the depth limit
/// 4. Return the aggregate report
///
/// # Arguments
///
/// * `config` - The merged configuration
/// * `start_url` - The URL to start from
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed (check `is_success` for page errors)
/// * `Err(ProbeError)` - Invalid configuration or start URL, or the fetcher failed to start
///
/// # Example
///
/// ```no_run
/// use site_probe::config::Config;
/// use site_probe::crawler::probe;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = probe(Config::default(), "https://example.com/").await?;
/// println!("{} errors", report.total_errors());
/// # Ok(())
/// # }
/// ```
pub async fn probe(config: Config, start_url: &str) -> Result<CrawlReport, ProbeError> {
    let fetcher = Arc::new(HttpFetcher::new(config.browser.clone()));
    let crawler = Crawler::new(config, fetcher)?;
    crawler.crawl(start_url).await
}
