//! Configuration module for Site-Probe
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Command-line flags are applied on top of the loaded file by the binary and
//! the merged result is validated again with [`validate`].
//!
//! # Example
//!
//! ```no_run
//! use site_probe::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("probe.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BrowserConfig, CacheConfig, Config, CrawlerConfig, ReportingConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
