//! Plugin hooks for observing and filtering a crawl
//!
//! A plugin is a named set of independently optional callbacks. Hooks run in
//! registration order. Every hook returns `anyhow::Result`; a failing hook is
//! logged and the crawl carries on as if the hook had not been registered.
//!
//! | Hook | Runs | On failure |
//! |------|------|------------|
//! | `before_crawl` | once, before the first visit | logged |
//! | `after_crawl` | once, with every result | logged |
//! | `before_visit` | before navigation | logged, visit continues |
//! | `after_visit` | after link harvesting | logged |
//! | `on_error` | when a visit aborts | logged |
//! | `on_link` | per harvested link; first `false` drops it | logged, link kept |
//!
//! # Example
//!
//! ```
//! use site_probe::plugin::Plugin;
//!
//! let plugin = Plugin::new("skip-logout")
//!     .on_link(|link, _source| Ok(!link.contains("/logout")))
//!     .after_visit(|_page, _url, depth, result| {
//!         result.metadata.insert("depth".to_string(), depth.into());
//!         Box::pin(async { anyhow::Ok(()) })
//!     });
//! assert_eq!(plugin.name(), "skip-logout");
//! ```

use crate::crawler::{Crawler, Page};
use crate::output::{CrawlError, CrawlResult};
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Result returned by every hook
pub type HookResult<T = ()> = anyhow::Result<T>;

type CrawlHook = Arc<dyn Fn(&Crawler) -> HookResult + Send + Sync>;
type AfterCrawlHook = Arc<dyn Fn(&Crawler, &BTreeMap<String, CrawlResult>) -> HookResult + Send + Sync>;
type BeforeVisitHook =
    Arc<dyn for<'a> Fn(&'a dyn Page, &'a str, u32) -> BoxFuture<'a, HookResult> + Send + Sync>;
type AfterVisitHook = Arc<
    dyn for<'a> Fn(&'a dyn Page, &'a str, u32, &'a mut CrawlResult) -> BoxFuture<'a, HookResult>
        + Send
        + Sync,
>;
type ErrorHook = Arc<dyn Fn(&CrawlError, &str) -> HookResult + Send + Sync>;
type LinkHook = Arc<dyn Fn(&str, &str) -> HookResult<bool> + Send + Sync>;

/// A named set of optional crawl hooks
#[derive(Clone, Default)]
pub struct Plugin {
    name: String,
    before_crawl: Option<CrawlHook>,
    after_crawl: Option<AfterCrawlHook>,
    before_visit: Option<BeforeVisitHook>,
    after_visit: Option<AfterVisitHook>,
    on_error: Option<ErrorHook>,
    on_link: Option<LinkHook>,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs once before the first page is visited
    pub fn before_crawl<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Crawler) -> HookResult + Send + Sync + 'static,
    {
        self.before_crawl = Some(Arc::new(hook));
        self
    }

    /// Runs once after the last visit, with every result keyed by URL
    pub fn after_crawl<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Crawler, &BTreeMap<String, CrawlResult>) -> HookResult + Send + Sync + 'static,
    {
        self.after_crawl = Some(Arc::new(hook));
        self
    }

    /// Runs on the freshly opened page before navigation
    pub fn before_visit<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a dyn Page, &'a str, u32) -> BoxFuture<'a, HookResult>
            + Send
            + Sync
            + 'static,
    {
        self.before_visit = Some(Arc::new(hook));
        self
    }

    /// Runs after link harvesting with mutable access to the page's result
    pub fn after_visit<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a dyn Page, &'a str, u32, &'a mut CrawlResult) -> BoxFuture<'a, HookResult>
            + Send
            + Sync
            + 'static,
    {
        self.after_visit = Some(Arc::new(hook));
        self
    }

    /// Runs once when a visit aborts
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CrawlError, &str) -> HookResult + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Runs for each harvested link; returning `false` drops the link
    pub fn on_link<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &str) -> HookResult<bool> + Send + Sync + 'static,
    {
        self.on_link = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("before_crawl", &self.before_crawl.is_some())
            .field("after_crawl", &self.after_crawl.is_some())
            .field("before_visit", &self.before_visit.is_some())
            .field("after_visit", &self.after_visit.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_link", &self.on_link.is_some())
            .finish()
    }
}

/// Ordered collection of plugins with contained hook dispatch
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Plugin>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Plugin) {
        tracing::debug!("Registered plugin '{}'", plugin.name);
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(Plugin::name)
    }

    pub fn before_crawl(&self, crawler: &Crawler) {
        for plugin in &self.plugins {
            if let Some(hook) = &plugin.before_crawl {
                contain(plugin, "before_crawl", hook(crawler));
            }
        }
    }

    pub fn after_crawl(&self, crawler: &Crawler, results: &BTreeMap<String, CrawlResult>) {
        for plugin in &self.plugins {
            if let Some(hook) = &plugin.after_crawl {
                contain(plugin, "after_crawl", hook(crawler, results));
            }
        }
    }

    pub async fn before_visit(&self, page: &dyn Page, url: &str, depth: u32) {
        for plugin in &self.plugins {
            if let Some(hook) = &plugin.before_visit {
                contain(plugin, "before_visit", hook(page, url, depth).await);
            }
        }
    }

    pub async fn after_visit(&self, page: &dyn Page, url: &str, depth: u32, result: &mut CrawlResult) {
        for plugin in &self.plugins {
            if let Some(hook) = &plugin.after_visit {
                contain(plugin, "after_visit", hook(page, url, depth, result).await);
            }
        }
    }

    pub fn on_error(&self, error: &CrawlError, url: &str) {
        for plugin in &self.plugins {
            if let Some(hook) = &plugin.on_error {
                contain(plugin, "on_error", hook(error, url));
            }
        }
    }

    /// Returns false as soon as one `on_link` hook rejects the link
    pub fn allows_link(&self, link: &str, source_url: &str) -> bool {
        for plugin in &self.plugins {
            let Some(hook) = &plugin.on_link else {
                continue;
            };

            match hook(link, source_url) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::trace!("Plugin '{}' dropped link {}", plugin.name, link);
                    return false;
                }
                Err(e) => contain(plugin, "on_link", Err(e)),
            }
        }
        true
    }
}

/// Logs a failed hook without propagating it
fn contain(plugin: &Plugin, hook: &str, result: HookResult) {
    if let Err(e) = result {
        tracing::warn!("Plugin '{}' failed in {}: {:#}", plugin.name, hook, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_on_link_short_circuits() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let first_calls = Arc::clone(&calls);
        let second_calls = Arc::clone(&calls);

        let mut registry = PluginRegistry::new();
        registry.register(Plugin::new("first").on_link(move |link, _| {
            first_calls.lock().push("first");
            Ok(!link.ends_with("/private"))
        }));
        registry.register(Plugin::new("second").on_link(move |_, _| {
            second_calls.lock().push("second");
            Ok(true)
        }));

        assert!(!registry.allows_link("https://example.com/private", "https://example.com/"));
        assert_eq!(*calls.lock(), vec!["first"]);

        assert!(registry.allows_link("https://example.com/public", "https://example.com/"));
        assert_eq!(*calls.lock(), vec!["first", "first", "second"]);
    }

    #[test]
    fn test_failing_on_link_keeps_link() {
        let mut registry = PluginRegistry::new();
        registry.register(Plugin::new("broken").on_link(|_, _| anyhow::bail!("boom")));
        registry.register(Plugin::new("ok").on_link(|_, _| Ok(true)));

        assert!(registry.allows_link("https://example.com/a", "https://example.com/"));
    }

    #[test]
    fn test_on_error_runs_all_plugins_despite_failure() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_hook = Arc::clone(&seen);

        let mut registry = PluginRegistry::new();
        registry.register(Plugin::new("broken").on_error(|_, _| anyhow::bail!("boom")));
        registry.register(Plugin::new("recorder").on_error(move |error, url| {
            seen_hook.lock().push(format!("{} {}", url, error.message));
            Ok(())
        }));

        let error = CrawlError::navigation("Navigation failed", "https://example.com/");
        registry.on_error(&error, "https://example.com/");

        assert_eq!(*seen.lock(), vec!["https://example.com/ Navigation failed"]);
    }

    #[test]
    fn test_plugin_without_hooks_is_inert() {
        let mut registry = PluginRegistry::new();
        registry.register(Plugin::new("empty"));

        assert!(registry.allows_link("https://example.com/", "https://example.com/"));
        registry.on_error(&CrawlError::navigation("x", "y"), "y");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["empty"]);
    }

    #[test]
    fn test_debug_lists_attached_hooks() {
        let plugin = Plugin::new("dbg").on_link(|_, _| Ok(true));
        let text = format!("{:?}", plugin);
        assert!(text.contains("on_link: true"));
        assert!(text.contains("on_error: false"));
    }
}
