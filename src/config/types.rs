use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Site-Probe
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub browser: BrowserConfig,
    pub cache: CacheConfig,
    pub reporting: ReportingConfig,
}

/// Crawl scheduling configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum link depth from the start URL (the start URL is depth 0)
    pub max_depth: u32,

    /// Maximum number of page visits in flight at once
    pub concurrency: usize,

    /// Visit only the start URL and skip link harvesting
    pub single_page: bool,

    /// Record skipped links in the skip ledger
    pub log_skipped: bool,

    /// Hard bound on page navigation (milliseconds)
    pub navigation_timeout_ms: u64,

    /// Soft bound on waiting for a page to go idle (milliseconds)
    pub idle_timeout_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            concurrency: 4,
            single_page: false,
            log_skipped: false,
            navigation_timeout_ms: 30_000,
            idle_timeout_ms: 5_000,
        }
    }
}

impl CrawlerConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// Page fetcher configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    /// Run the fetcher without a visible window
    pub headless: bool,

    /// Log a probe line for every visited page
    pub show_probe: bool,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            show_probe: false,
            user_agent: format!("site-probe/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Resource cache configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CacheConfig {
    /// Path suffixes (with leading dot) whose responses are cached
    pub extensions: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            extensions: [".css", ".js", ".mjs", ".woff", ".woff2", ".ttf", ".otf", ".eot"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

/// Error reporting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ReportingConfig {
    /// Verbose diagnostics; also records failed sub-resource requests as errors
    pub verbose: bool,

    /// Regular expressions; console errors matching any of them are ignored
    pub console_ignore_patterns: Vec<String>,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            console_ignore_patterns: vec![r"favicon\.ico".to_string()],
        }
    }
}
