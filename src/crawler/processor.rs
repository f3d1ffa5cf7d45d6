//! Page processor - one page visit from open to cleanup
//!
//! A visit runs these steps in order:
//! 1. Open an isolated page from the fetcher
//! 2. Run `before_visit` hooks
//! 3. Navigate under a hard timeout; HTTP status >= 400 is recorded but not fatal
//! 4. Wait for the page to settle under a soft timeout
//! 5. Harvest anchors and filter them through `on_link` hooks
//! 6. Run `after_visit` hooks
//! 7. Close the page, whatever happened before
//!
//! Only a failure in steps 1, 3 or 5, or a panic, aborts the visit. Page
//! events are drained after the page settles and again after it is closed.

use crate::cache::ResourceCache;
use crate::config::Config;
use crate::crawler::fetcher::{ConsoleLevel, Page, PageContext, PageEvent, PageFetcher};
use crate::output::{CrawlError, CrawlResult, ErrorKind, ErrorReporter};
use crate::plugin::PluginRegistry;
use crate::state::WorkItem;
use crate::ConfigError;
use futures::FutureExt;
use regex::RegexSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Per-visit settings derived from the configuration
#[derive(Debug, Clone)]
pub struct VisitSettings {
    pub navigation_timeout: Duration,
    pub idle_timeout: Duration,
    pub single_page: bool,
    pub verbose: bool,
    pub show_probe: bool,
    pub console_ignore: RegexSet,
}

impl VisitSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let console_ignore = RegexSet::new(&config.reporting.console_ignore_patterns)
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            navigation_timeout: config.crawler.navigation_timeout(),
            idle_timeout: config.crawler.idle_timeout(),
            single_page: config.crawler.single_page,
            verbose: config.reporting.verbose,
            show_probe: config.browser.show_probe,
            console_ignore,
        })
    }
}

/// A finished visit, handed back to the scheduler
#[derive(Debug)]
pub struct VisitOutcome {
    pub item: WorkItem,
    pub result: CrawlResult,
}

/// Visits single pages and turns everything they report into a `CrawlResult`
pub struct PageProcessor {
    fetcher: Arc<dyn PageFetcher>,
    cache: Arc<ResourceCache>,
    reporter: Arc<ErrorReporter>,
    plugins: PluginRegistry,
    settings: VisitSettings,
}

impl PageProcessor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        cache: Arc<ResourceCache>,
        reporter: Arc<ErrorReporter>,
        plugins: PluginRegistry,
        settings: VisitSettings,
    ) -> Self {
        Self {
            fetcher,
            cache,
            reporter,
            plugins,
            settings,
        }
    }

    /// Visits one page
    ///
    /// Never fails: every problem ends up as an error in the returned result.
    /// A panic in a hook or in the page is recorded like an aborted
    /// navigation, and the page is closed afterwards.
    pub async fn visit(&self, item: &WorkItem) -> CrawlResult {
        let started = Instant::now();
        let mut result = CrawlResult::new(&item.url);
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let context = PageContext::new(Arc::clone(&self.cache), events_tx);

        let page = match self.fetcher.open_page(context).await {
            Ok(page) => page,
            Err(e) => {
                let error = CrawlError::navigation(format!("Failed to open page: {}", e), &item.url);
                self.abort(&mut result, error);
                return result;
            }
        };

        let steps = async {
            self.plugins
                .before_visit(page.as_ref(), &item.url, item.depth)
                .await;
            self.drive(page.as_ref(), item, &mut result, &mut events).await
        };

        let outcome = AssertUnwindSafe(steps).catch_unwind().await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => self.abort(&mut result, error),
            Err(_) => self.abort(&mut result, panicked(&item.url)),
        }

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page for {}: {}", item.url, e);
        }
        drop(page);
        self.drain_events(&mut events, &mut result);

        if self.settings.show_probe {
            let status = result
                .metadata
                .get("status")
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            tracing::info!(
                "[probe] {} status={} links={} errors={} {}ms",
                item,
                status,
                result.links.len(),
                result.errors.len(),
                started.elapsed().as_millis()
            );
        }

        result
    }

    /// Visits one page, turning a panic outside the page steps into a navigation error
    ///
    /// Panics between opening and closing the page are already handled by
    /// `visit`, which still closes the page.
    pub async fn visit_contained(self: Arc<Self>, item: WorkItem) -> VisitOutcome {
        let result = match AssertUnwindSafe(self.visit(&item)).catch_unwind().await {
            Ok(result) => result,
            Err(_) => {
                let mut result = CrawlResult::new(&item.url);
                self.abort(&mut result, panicked(&item.url));
                result
            }
        };

        VisitOutcome { item, result }
    }

    /// Navigation, settling, harvesting and `after_visit`
    ///
    /// An `Err` aborts the visit; the caller records it.
    async fn drive(
        &self,
        page: &dyn Page,
        item: &WorkItem,
        result: &mut CrawlResult,
        events: &mut UnboundedReceiver<PageEvent>,
    ) -> Result<(), CrawlError> {
        let url = item.url.as_str();
        let timeout = self.settings.navigation_timeout;

        let response = match tokio::time::timeout(timeout, page.navigate(url, timeout)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(CrawlError::navigation(format!("Navigation failed: {}", e), url));
            }
            Err(_) => {
                return Err(CrawlError::navigation(
                    format!("Navigation timed out after {}ms", timeout.as_millis()),
                    url,
                ));
            }
        };

        result
            .metadata
            .insert("status".to_string(), response.status.into());
        if response.url != url {
            result
                .metadata
                .insert("final_url".to_string(), response.url.clone().into());
        }

        if response.status >= 400 {
            let error = CrawlError::navigation(format!("HTTP {} error", response.status), url);
            self.record(result, error);
        }

        let idle = self.settings.idle_timeout;
        match tokio::time::timeout(idle, page.wait_for_idle(idle)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("Idle wait failed for {}: {}", url, e),
            Err(_) => tracing::debug!("{} did not settle within {}ms", url, idle.as_millis()),
        }
        self.drain_events(events, result);

        if !self.settings.single_page {
            let hrefs = page
                .anchor_hrefs()
                .await
                .map_err(|e| CrawlError::navigation(format!("Link harvesting failed: {}", e), url))?;

            result.links = hrefs
                .into_iter()
                .filter(|link| self.plugins.allows_link(link, url))
                .collect();
        }

        self.plugins.after_visit(page, url, item.depth, result).await;
        Ok(())
    }

    /// Records an aborting error and notifies `on_error` hooks
    fn abort(&self, result: &mut CrawlResult, error: CrawlError) {
        self.record(result, error.clone());
        self.plugins.on_error(&error, &result.url);
    }

    /// Reports an error crawl-wide and attaches it to the page result
    fn record(&self, result: &mut CrawlResult, error: CrawlError) {
        self.reporter.report(&error, &result.url);
        result.push_error(error);
    }

    fn drain_events(&self, events: &mut UnboundedReceiver<PageEvent>, result: &mut CrawlResult) {
        while let Ok(event) = events.try_recv() {
            if let Some(error) = self.event_error(event) {
                self.record(result, error);
            }
        }
    }

    /// Maps a page event onto a crawl error, if it counts as one
    fn event_error(&self, event: PageEvent) -> Option<CrawlError> {
        match event {
            PageEvent::ScriptError {
                message,
                stack,
                location,
            } => {
                let mut error = CrawlError::new(ErrorKind::Script, message);
                error.stack = stack;
                error.location = location;
                Some(error)
            }
            PageEvent::Console {
                level: ConsoleLevel::Error,
                text,
                location,
            } => {
                if self.settings.console_ignore.is_match(&text) {
                    tracing::trace!("Ignoring console error: {}", text);
                    return None;
                }
                let mut error = CrawlError::new(ErrorKind::Console, text);
                error.location = location;
                Some(error)
            }
            PageEvent::Console { .. } => None,
            PageEvent::RequestFailed { url, reason } => {
                if !self.settings.verbose {
                    tracing::debug!("Request failed: {} ({})", url, reason);
                    return None;
                }
                let error = CrawlError::new(ErrorKind::Request, format!("Request failed: {}", reason));
                Some(error.with_location(url))
            }
        }
    }
}

fn panicked(url: &str) -> CrawlError {
    CrawlError::navigation("Visit task panicked", url)
}
