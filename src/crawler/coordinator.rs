//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Normalizing the start URL and starting the page fetcher
//! - Managing the frontier, visited set and skip ledger
//! - Running page visits under a fixed concurrency bound
//! - Classifying discovered links and feeding them back into the frontier
//! - Generating the final report

use crate::cache::ResourceCache;
use crate::config::{validate, Config};
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::processor::{PageProcessor, VisitOutcome, VisitSettings};
use crate::output::{CrawlError, CrawlReport, CrawlResult, ErrorReporter};
use crate::plugin::{Plugin, PluginRegistry};
use crate::state::{Frontier, SkipLedger, SkipReason, VisitedSet, WorkItem};
use crate::url::{classify_link, normalize_start_url, LinkClassification};
use crate::ProbeError;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use url::{Origin, Url};

/// Main crawler structure
///
/// The resource cache and error reporter live as long as the crawler; the
/// frontier, visited set and skip ledger live for one `crawl` call.
pub struct Crawler {
    config: Config,
    fetcher: Arc<dyn PageFetcher>,
    cache: Arc<ResourceCache>,
    reporter: Arc<ErrorReporter>,
    plugins: PluginRegistry,
    settings: VisitSettings,
}

impl Crawler {
    /// Creates a new crawler
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fetcher` - The page fetcher visits are run through
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Configuration is valid
    /// * `Err(ProbeError)` - Configuration failed validation
    pub fn new(config: Config, fetcher: Arc<dyn PageFetcher>) -> Result<Self, ProbeError> {
        validate(&config)?;
        let settings = VisitSettings::from_config(&config)?;
        let cache = Arc::new(ResourceCache::new(&config.cache));

        Ok(Self {
            config,
            fetcher,
            cache,
            reporter: Arc::new(ErrorReporter::new()),
            plugins: PluginRegistry::new(),
            settings,
        })
    }

    pub fn register_plugin(&mut self, plugin: Plugin) {
        self.plugins.register(plugin);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Returns every distinct error reported by the current or last crawl
    pub fn errors(&self) -> Vec<CrawlError> {
        self.reporter.errors()
    }

    /// Crawls the site reachable from `start_url`
    ///
    /// This is the core crawling logic that:
    /// 1. Normalizes the start URL and starts the fetcher
    /// 2. Seeds the frontier at depth 0
    /// 3. Keeps up to `concurrency` visits in flight until the frontier is
    ///    exhausted and every visit has finished
    /// 4. Feeds same-origin links within the depth limit back into the frontier
    /// 5. Shuts the fetcher down and assembles the report
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl ran to completion, errors or not
    /// * `Err(ProbeError)` - Invalid start URL or the fetcher failed to start
    pub async fn crawl(&self, start_url: &str) -> Result<CrawlReport, ProbeError> {
        let start = normalize_start_url(start_url)?;
        let started_at = Utc::now();
        let concurrency = self.config.crawler.concurrency;

        tracing::info!(
            "Starting crawl of {} (max depth {}, concurrency {})",
            start,
            self.config.crawler.max_depth,
            concurrency
        );

        self.fetcher
            .start()
            .await
            .map_err(ProbeError::FetcherStartup)?;
        self.reporter.clear();

        let processor = Arc::new(PageProcessor::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.cache),
            Arc::clone(&self.reporter),
            self.plugins.clone(),
            self.settings.clone(),
        ));

        let mut state = CrawlState::new(
            &start,
            self.config.crawler.max_depth,
            self.config.crawler.log_skipped,
        );

        if !self.plugins.is_empty() {
            let names: Vec<&str> = self.plugins.names().collect();
            tracing::debug!("{} plugins registered: {}", self.plugins.len(), names.join(", "));
        }
        self.plugins.before_crawl(self);

        let start_time = Instant::now();
        let mut in_flight = JoinSet::new();

        while state.frontier.has_work() || !in_flight.is_empty() {
            while in_flight.len() < concurrency {
                let Some(item) = state.next_visit() else {
                    break;
                };
                tracing::debug!("Visiting {}", item);
                in_flight.spawn(Arc::clone(&processor).visit_contained(item));
            }

            let Some(joined) = in_flight.join_next().await else {
                continue;
            };

            match joined {
                Ok(outcome) => state.absorb(outcome),
                Err(e) => tracing::error!("Visit task failed: {}", e),
            }

            let pages_visited = state.results.len();
            if pages_visited > 0 && pages_visited % 10 == 0 {
                let rate = pages_visited as f64 / start_time.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress: {} pages visited, {} queued, {} in flight, {:.2} pages/sec",
                    pages_visited,
                    state.frontier.len(),
                    in_flight.len(),
                    rate
                );
            }
        }

        state.settle_unfinished(&self.reporter);

        if let Err(e) = self.fetcher.shutdown().await {
            tracing::warn!("Failed to shut down page fetcher: {}", e);
        }

        if state.skipped.is_enabled() {
            log_skipped(&state.skipped);
        }

        self.plugins.after_crawl(self, &state.results);

        let report = CrawlReport {
            start_url: start.to_string(),
            started_at,
            finished_at: Utc::now(),
            visited: state.visited.len(),
            cache: self.cache.stats(),
            skipped: state
                .skipped
                .is_enabled()
                .then(|| state.skipped.counts()),
            errors: self.reporter.errors(),
            results: state.results,
        };

        tracing::info!(
            "Crawl completed: {} pages visited, {} errors in {:?}",
            report.visited,
            report.total_errors(),
            start_time.elapsed()
        );

        Ok(report)
    }
}

/// Bookkeeping owned by the crawl loop for one `crawl` call
struct CrawlState {
    origin: Origin,
    max_depth: u32,
    frontier: Frontier,
    visited: VisitedSet,
    skipped: SkipLedger,
    results: BTreeMap<String, CrawlResult>,
}

impl CrawlState {
    fn new(start: &Url, max_depth: u32, log_skipped: bool) -> Self {
        let mut frontier = Frontier::new();
        frontier.add([WorkItem::new(start.as_str(), 0)]);

        Self {
            origin: start.origin(),
            max_depth,
            frontier,
            visited: VisitedSet::new(),
            skipped: SkipLedger::new(log_skipped),
            results: BTreeMap::new(),
        }
    }

    /// Pops the next unvisited item and marks it visited
    fn next_visit(&mut self) -> Option<WorkItem> {
        while let Some(item) = self.frontier.next_item() {
            if self.visited.insert(&item.url) {
                return Some(item);
            }
            self.skipped.record(SkipReason::AlreadyVisited, &item.url);
        }
        None
    }

    /// Stores a finished visit and enqueues the links it discovered
    fn absorb(&mut self, outcome: VisitOutcome) {
        let VisitOutcome { item, result } = outcome;
        let mut discovered = Vec::new();

        for link in &result.links {
            match classify_link(link, &self.origin, item.depth, self.max_depth) {
                LinkClassification::Crawlable { url, depth } => {
                    let url = url.to_string();
                    if self.visited.contains(&url) {
                        self.skipped.record(SkipReason::AlreadyVisited, &url);
                    } else {
                        discovered.push(WorkItem::new(url, depth));
                    }
                }
                LinkClassification::External(url) => {
                    self.skipped.record(SkipReason::External, &url);
                }
                LinkClassification::DepthExceeded(url) => {
                    self.skipped.record(SkipReason::DepthExceeded, &url);
                }
                LinkClassification::Malformed(link) => {
                    self.skipped.record(SkipReason::Malformed, &link);
                }
            }
        }

        tracing::trace!("{} queued {} links", item, discovered.len());
        self.frontier.add(discovered);
        self.results.insert(result.url.clone(), result);
    }

    /// Gives every visited URL whose task never reported back a failed result
    fn settle_unfinished(&mut self, reporter: &ErrorReporter) {
        let unfinished: Vec<String> = self
            .visited
            .iter()
            .filter(|url| !self.results.contains_key(*url))
            .map(str::to_string)
            .collect();

        for url in unfinished {
            let error = CrawlError::navigation("Visit task did not complete", &url);
            reporter.report(&error, &url);
            let mut result = CrawlResult::new(&url);
            result.push_error(error);
            self.results.insert(url, result);
        }
    }
}

fn log_skipped(ledger: &SkipLedger) {
    let counts = ledger.counts();
    tracing::info!("Skipped {} links", counts.total());

    for reason in [
        SkipReason::External,
        SkipReason::AlreadyVisited,
        SkipReason::DepthExceeded,
        SkipReason::Malformed,
    ] {
        for url in ledger.urls(reason) {
            tracing::info!("  skipped ({}): {}", reason, url);
        }
    }
}
