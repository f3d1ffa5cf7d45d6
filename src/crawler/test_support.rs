//! Scriptable in-memory page fetcher for crawler tests

use crate::crawler::fetcher::{NavigationResponse, Page, PageContext, PageEvent, PageFetcher};
use crate::FetchError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scripted behaviour of one URL
#[derive(Debug, Clone)]
pub struct FakePage {
    status: u16,
    links: Vec<String>,
    events: Vec<PageEvent>,
    delay: Duration,
    fail_navigation: bool,
    fail_harvest: bool,
    idle_hangs: bool,
    panics: bool,
}

impl FakePage {
    pub fn ok() -> Self {
        Self {
            status: 200,
            links: Vec::new(),
            events: Vec::new(),
            delay: Duration::ZERO,
            fail_navigation: false,
            fail_harvest: false,
            idle_hangs: false,
            panics: false,
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links.extend(links.into_iter().map(Into::into));
        self
    }

    /// Event emitted while the page navigates
    pub fn event(mut self, event: PageEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Navigation takes this long
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    pub fn harvest_fails(mut self) -> Self {
        self.fail_harvest = true;
        self
    }

    pub fn idle_hangs(mut self) -> Self {
        self.idle_hangs = true;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }
}

#[derive(Debug, Default)]
struct FetchLog {
    open: AtomicUsize,
    max_open: AtomicUsize,
    closed: AtomicUsize,
    navigations: Mutex<Vec<String>>,
}

/// Fetcher serving scripted pages; unknown URLs answer 404 with no links
#[derive(Debug, Clone, Default)]
pub struct FakeFetcher {
    pages: Arc<HashMap<String, FakePage>>,
    fail_start: bool,
    log: Arc<FetchLog>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.to_string(), page);
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// URLs navigated to, in order
    pub fn navigations(&self) -> Vec<String> {
        self.log.navigations.lock().clone()
    }

    /// Pages currently open
    pub fn open_pages(&self) -> usize {
        self.log.open.load(Ordering::SeqCst)
    }

    /// Number of `close` calls across all pages
    pub fn closed_pages(&self) -> usize {
        self.log.closed.load(Ordering::SeqCst)
    }

    /// Highest number of pages that were open at the same time
    pub fn max_in_flight(&self) -> usize {
        self.log.max_open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn start(&self) -> Result<(), FetchError> {
        if self.fail_start {
            return Err(FetchError::Startup("fake fetcher refused to start".to_string()));
        }
        Ok(())
    }

    async fn open_page(&self, context: PageContext) -> Result<Box<dyn Page>, FetchError> {
        let open = self.log.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.max_open.fetch_max(open, Ordering::SeqCst);

        Ok(Box::new(FakeTab {
            pages: Arc::clone(&self.pages),
            log: Arc::clone(&self.log),
            context,
            current: Mutex::new(None),
        }))
    }
}

struct FakeTab {
    pages: Arc<HashMap<String, FakePage>>,
    log: Arc<FetchLog>,
    context: PageContext,
    current: Mutex<Option<FakePage>>,
}

impl Drop for FakeTab {
    fn drop(&mut self) {
        self.log.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Page for FakeTab {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<NavigationResponse, FetchError> {
        self.log.navigations.lock().push(url.to_string());

        let page = self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| FakePage::ok().status(404));

        if !page.delay.is_zero() {
            tokio::time::sleep(page.delay).await;
        }
        if page.panics {
            panic!("fake page {} panicked", url);
        }
        if page.fail_navigation {
            return Err(FetchError::Other("connection refused".to_string()));
        }

        for event in &page.events {
            self.context.emit(event.clone());
        }

        let status = page.status;
        *self.current.lock() = Some(page);

        Ok(NavigationResponse {
            status,
            url: url.to_string(),
        })
    }

    async fn wait_for_idle(&self, _timeout: Duration) -> Result<(), FetchError> {
        let hangs = self.current.lock().as_ref().map(|p| p.idle_hangs).unwrap_or(false);
        if hangs {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn anchor_hrefs(&self) -> Result<Vec<String>, FetchError> {
        let current = self.current.lock();
        let page = current.as_ref().ok_or(FetchError::NoDocument)?;
        if page.fail_harvest {
            return Err(FetchError::Other("page crashed".to_string()));
        }
        Ok(page.links.clone())
    }

    async fn close(&self) -> Result<(), FetchError> {
        self.log.closed.fetch_add(1, Ordering::SeqCst);
        self.current.lock().take();
        Ok(())
    }
}
