use crate::config::types::{BrowserConfig, CacheConfig, Config, CrawlerConfig, ReportingConfig};
use crate::ConfigError;
use regex::Regex;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_browser_config(&config.browser)?;
    validate_cache_config(&config.cache)?;
    validate_reporting_config(&config.reporting)?;
    Ok(())
}

/// Validates crawl scheduling configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 64, got {}",
            config.concurrency
        )));
    }

    if config.navigation_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "navigation_timeout_ms must be >= 100ms, got {}ms",
            config.navigation_timeout_ms
        )));
    }

    if config.idle_timeout_ms > config.navigation_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "idle_timeout_ms ({}ms) cannot exceed navigation_timeout_ms ({}ms)",
            config.idle_timeout_ms, config.navigation_timeout_ms
        )));
    }

    Ok(())
}

fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the cacheable extension allow-list
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.extensions.is_empty() {
        return Err(ConfigError::Validation(
            "cache extensions cannot be empty".to_string(),
        ));
    }

    for ext in &config.extensions {
        if ext.len() < 2 || !ext.starts_with('.') {
            return Err(ConfigError::InvalidPattern(format!(
                "Cache extension '{}' must start with '.' and name a suffix",
                ext
            )));
        }

        if ext.contains('/') || ext.contains('?') {
            return Err(ConfigError::InvalidPattern(format!(
                "Cache extension '{}' contains invalid characters",
                ext
            )));
        }
    }

    Ok(())
}

/// Validates that every console ignore pattern compiles
fn validate_reporting_config(config: &ReportingConfig) -> Result<(), ConfigError> {
    for pattern in &config.console_ignore_patterns {
        Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!(
                "Invalid console ignore pattern '{}': {}",
                pattern, e
            ))
        })?;
    }

    Ok(())
}
