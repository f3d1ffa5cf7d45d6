//! Page fetcher abstraction and HTTP implementation
//!
//! This module defines the capability set the crawler needs from whatever
//! actually loads pages:
//! - Starting and shutting down the fetcher
//! - Opening an isolated page with access to the shared resource cache
//! - Navigating, waiting for idle, and listing anchor targets
//! - Reporting script errors, console messages and failed requests as events
//!
//! `HttpFetcher` implements it with plain HTTP: documents are fetched with
//! reqwest, sub-resources are loaded through the resource cache while the
//! page settles, and anchors are read from the HTML.

use crate::cache::{CachedResource, ResourceCache};
use crate::config::BrowserConfig;
use crate::crawler::parser::{extract_anchor_hrefs, extract_subresources};
use crate::FetchError;
use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use reqwest::{redirect::Policy, Client};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

/// Response to a page navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationResponse {
    /// HTTP status of the main document
    pub status: u16,

    /// Final URL after redirects
    pub url: String,
}

/// Severity of a console message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Debug,
    Log,
    Info,
    Warning,
    Error,
}

/// Something a page reported while it was open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// Uncaught exception in the page
    ScriptError {
        message: String,
        stack: Option<String>,
        location: Option<String>,
    },

    /// Console message
    Console {
        level: ConsoleLevel,
        text: String,
        location: Option<String>,
    },

    /// A sub-resource request failed or returned an error status
    RequestFailed { url: String, reason: String },
}

/// Everything a page receives from the crawler when it is opened
#[derive(Debug, Clone)]
pub struct PageContext {
    cache: Arc<ResourceCache>,
    events: UnboundedSender<PageEvent>,
}

impl PageContext {
    pub fn new(cache: Arc<ResourceCache>, events: UnboundedSender<PageEvent>) -> Self {
        Self { cache, events }
    }

    /// Shared resource cache used to intercept sub-resource requests
    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// Delivers an event to the visit that owns this page
    ///
    /// Events sent after the visit has finished are dropped.
    pub fn emit(&self, event: PageEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("Dropping page event after visit finished");
        }
    }
}

/// One isolated browsing context
#[async_trait]
pub trait Page: Send + Sync {
    /// Loads `url`, giving up after `timeout`
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<NavigationResponse, FetchError>;

    /// Waits until the page stops loading, giving up after `timeout`
    async fn wait_for_idle(&self, timeout: Duration) -> Result<(), FetchError>;

    /// Returns the resolved target of every anchor on the page
    async fn anchor_hrefs(&self) -> Result<Vec<String>, FetchError>;

    /// Navigates to a blank state and releases the page
    async fn close(&self) -> Result<(), FetchError>;
}

/// Factory for pages
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Starts the fetcher; failure aborts the crawl before any visit
    async fn start(&self) -> Result<(), FetchError>;

    /// Opens a new isolated page
    async fn open_page(&self, context: PageContext) -> Result<Box<dyn Page>, FetchError>;

    /// Releases fetcher-wide resources after the crawl
    async fn shutdown(&self) -> Result<(), FetchError> {
        Ok(())
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The browser configuration (user agent)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &BrowserConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page fetcher backed by plain HTTP requests
pub struct HttpFetcher {
    config: BrowserConfig,
    client: OnceLock<Client>,
}

impl HttpFetcher {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            client: OnceLock::new(),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn start(&self) -> Result<(), FetchError> {
        if self.client.get().is_some() {
            return Ok(());
        }

        if !self.config.headless {
            tracing::warn!("HTTP fetcher has no visible window; running headless");
        }

        let client =
            build_http_client(&self.config).map_err(|e| FetchError::Startup(e.to_string()))?;
        let _ = self.client.set(client);

        tracing::debug!("HTTP fetcher started (user agent: {})", self.config.user_agent);
        Ok(())
    }

    async fn open_page(&self, context: PageContext) -> Result<Box<dyn Page>, FetchError> {
        let client = self.client.get().cloned().ok_or(FetchError::NotStarted)?;
        Ok(Box::new(HttpPage::new(client, context)))
    }
}

/// The document currently loaded in an `HttpPage`
#[derive(Debug, Clone)]
struct LoadedDocument {
    url: Url,
    /// Body text, only kept for HTML documents
    html: Option<String>,
}

/// A page of the HTTP fetcher
pub struct HttpPage {
    client: Client,
    context: PageContext,
    document: Mutex<Option<LoadedDocument>>,
}

impl HttpPage {
    fn new(client: Client, context: PageContext) -> Self {
        Self {
            client,
            context,
            document: Mutex::new(None),
        }
    }

    fn snapshot(&self) -> Result<LoadedDocument, FetchError> {
        self.document.lock().clone().ok_or(FetchError::NoDocument)
    }

    /// Loads one sub-resource, consulting the cache for cacheable URLs
    async fn load_resource(&self, url: &str, timeout: Duration) {
        let outcome = self
            .context
            .cache()
            .get_or_fetch(url, || fetch_resource(&self.client, url, timeout))
            .await;

        match outcome {
            Ok(resource) if resource.status >= 400 => {
                self.context.emit(PageEvent::RequestFailed {
                    url: url.to_string(),
                    reason: format!("HTTP {}", resource.status),
                });
            }
            Ok(_) => {}
            Err(e) => {
                self.context.emit(PageEvent::RequestFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
}

#[async_trait]
impl Page for HttpPage {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<NavigationResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("html"))
            .unwrap_or(true);

        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        *self.document.lock() = Some(LoadedDocument {
            url: final_url.clone(),
            html: is_html.then_some(body),
        });

        Ok(NavigationResponse {
            status,
            url: final_url.to_string(),
        })
    }

    async fn wait_for_idle(&self, timeout: Duration) -> Result<(), FetchError> {
        let document = self.snapshot()?;
        let Some(html) = document.html else {
            return Ok(());
        };

        let resources = extract_subresources(&html, &document.url);
        tracing::trace!("Loading {} sub-resources for {}", resources.len(), document.url);

        join_all(resources.iter().map(|url| self.load_resource(url, timeout))).await;
        Ok(())
    }

    async fn anchor_hrefs(&self) -> Result<Vec<String>, FetchError> {
        let document = self.snapshot()?;
        Ok(document
            .html
            .map(|html| extract_anchor_hrefs(&html, &document.url))
            .unwrap_or_default())
    }

    async fn close(&self) -> Result<(), FetchError> {
        self.document.lock().take();
        Ok(())
    }
}

/// Performs a live GET for a sub-resource
async fn fetch_resource(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<CachedResource, FetchError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_error(url, timeout, e))?;

    let status = response.status().as_u16();
    let headers: HashMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let content_type = headers.get("content-type").cloned();

    let body = response
        .bytes()
        .await
        .map_err(|e| classify_error(url, timeout, e))?
        .to_vec();

    Ok(CachedResource {
        status,
        headers,
        body,
        content_type,
    })
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &str, timeout: Duration, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
