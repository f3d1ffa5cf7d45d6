//! Resource cache for page sub-resources
//!
//! Fonts, stylesheets and scripts tend to be shared by every page of a site.
//! The cache keeps the first successful response for each such URL for the
//! lifetime of one crawler, so later pages are served without a live fetch.
//!
//! Entries are immutable once stored and never evicted. Two visits that miss
//! on the same URL at the same time may both fetch it; the later store
//! replaces an identical entry, which is harmless for idempotent content.

use crate::config::CacheConfig;
use crate::FetchError;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use url::Url;

/// A fetched response kept by the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResource {
    /// HTTP status code
    pub status: u16,

    /// Response headers (lowercase names)
    pub headers: HashMap<String, String>,

    /// Response body
    pub body: Vec<u8>,

    /// Content-Type header value, if present
    pub content_type: Option<String>,
}

impl CachedResource {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Cache statistics for the crawl report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, Arc<CachedResource>>,
    hits: u64,
    misses: u64,
}

/// URL-keyed store of previously fetched resources
#[derive(Debug)]
pub struct ResourceCache {
    extensions: Vec<String>,
    inner: Mutex<CacheInner>,
}

impl ResourceCache {
    /// Creates an empty cache for the given extension allow-list
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            extensions: config
                .extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Returns true if responses for `url` may be cached
    ///
    /// Only the path is compared against the allow-list, case-insensitively,
    /// so `app.js?v=3` is cacheable under `.js`.
    pub fn should_cache(&self, url: &str) -> bool {
        let path = match Url::parse(url) {
            Ok(parsed) => parsed.path().to_ascii_lowercase(),
            Err(_) => return false,
        };

        self.extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }

    pub fn get(&self, url: &str) -> Option<Arc<CachedResource>> {
        self.inner.lock().entries.get(url).cloned()
    }

    /// Stores a resource under its exact URL
    pub fn set(&self, url: &str, resource: CachedResource) -> Arc<CachedResource> {
        let resource = Arc::new(resource);
        self.inner
            .lock()
            .entries
            .insert(url.to_string(), Arc::clone(&resource));
        resource
    }

    /// Returns the cached resource for `url`, fetching it on a miss
    ///
    /// Only status 200 responses are stored. Non-cacheable URLs are always
    /// fetched live and never counted as hits or misses.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        url: &str,
        fetch: F,
    ) -> Result<Arc<CachedResource>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedResource, FetchError>>,
    {
        if !self.should_cache(url) {
            return fetch().await.map(Arc::new);
        }

        {
            let mut inner = self.inner.lock();
            if let Some(hit) = inner.entries.get(url).cloned() {
                inner.hits += 1;
                tracing::trace!("Cache hit: {}", url);
                return Ok(hit);
            }
            inner.misses += 1;
        }

        let resource = fetch().await?;
        if resource.is_success() {
            tracing::trace!("Caching {} ({} bytes)", url, resource.body.len());
            Ok(self.set(url, resource))
        } else {
            Ok(Arc::new(resource))
        }
    }

    /// Total body bytes held by the cache
    pub fn total_bytes(&self) -> usize {
        self.inner
            .lock()
            .entries
            .values()
            .map(|resource| resource.body.len())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.entries.len(),
            total_bytes: inner.entries.values().map(|r| r.body.len()).sum(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> ResourceCache {
        ResourceCache::new(&CacheConfig::default())
    }

    fn resource(status: u16, body: &str) -> CachedResource {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/css".to_string());
        CachedResource {
            status,
            headers,
            body: body.as_bytes().to_vec(),
            content_type: Some("text/css".to_string()),
        }
    }

    #[test]
    fn test_should_cache_by_extension() {
        let cache = cache();
        assert!(cache.should_cache("https://example.com/site.css"));
        assert!(cache.should_cache("https://example.com/fonts/Inter.WOFF2"));
        assert!(cache.should_cache("https://example.com/app.js?v=3"));
        assert!(!cache.should_cache("https://example.com/index.html"));
        assert!(!cache.should_cache("https://example.com/css"));
        assert!(!cache.should_cache("https://example.com/page#x.css"));
        assert!(!cache.should_cache("not a url.css"));
    }

    #[test]
    fn test_set_and_get() {
        let cache = cache();
        assert!(cache.get("https://example.com/a.css").is_none());

        cache.set("https://example.com/a.css", resource(200, "body{}"));
        let hit = cache.get("https://example.com/a.css").unwrap();
        assert_eq!(hit.body, b"body{}");
        assert_eq!(cache.total_bytes(), 6);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_get_or_fetch_fetches_once() {
        let cache = cache();
        let fetches = AtomicUsize::new(0);
        let url = "https://example.com/site.css";

        let first = cache
            .get_or_fetch(url, || async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(resource(200, "h1{}"))
            })
            .await
            .unwrap();
        let second = cache
            .get_or_fetch(url, || async {
                fetches.fetch_add(1, Ordering::SeqCst);
                Ok(resource(200, "changed"))
            })
            .await
            .unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(second.body, b"h1{}");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_non_success_not_stored() {
        let cache = cache();
        let url = "https://example.com/missing.js";

        let result = cache
            .get_or_fetch(url, || async { Ok(resource(404, "")) })
            .await
            .unwrap();

        assert_eq!(result.status, 404);
        assert!(cache.get(url).is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_non_cacheable_always_fetched() {
        let cache = cache();
        let fetches = AtomicUsize::new(0);
        let url = "https://example.com/api/data";

        for _ in 0..2 {
            cache
                .get_or_fetch(url, || async {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(resource(200, "{}"))
                })
                .await
                .unwrap();
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let cache = cache();
        let result = cache
            .get_or_fetch("https://example.com/x.css", || async {
                Err(FetchError::Other("connection reset".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
