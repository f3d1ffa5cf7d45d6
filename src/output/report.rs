//! Crawl report generation
//!
//! This module provides the aggregate summary a crawl produces and the
//! operator-facing rendering of it.

use crate::cache::CacheStats;
use crate::output::types::{CrawlError, CrawlResult, ErrorKind};
use crate::state::SkipCounts;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Aggregate outcome of one crawl
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// Normalized start URL
    pub start_url: String,

    /// When the crawl started
    pub started_at: DateTime<Utc>,

    /// When the crawl finished
    pub finished_at: DateTime<Utc>,

    /// Number of distinct URLs visited
    pub visited: usize,

    /// Resource cache statistics
    pub cache: CacheStats,

    /// Skip-ledger counts (only when skip logging is enabled)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipCounts>,

    /// Distinct errors across the whole crawl
    pub errors: Vec<CrawlError>,

    /// Per-URL results
    pub results: BTreeMap<String, CrawlResult>,
}

impl CrawlReport {
    /// Total number of distinct errors across the crawl
    pub fn total_errors(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if the crawl saw no errors at all
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Counts distinct errors by kind
    pub fn errors_by_kind(&self) -> HashMap<ErrorKind, usize> {
        let mut counts = HashMap::new();
        for error in &self.errors {
            *counts.entry(error.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Writes the per-URL results as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(&self.results)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Prints the report to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The report to display
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Start URL: {}", report.start_url);
    println!("  Pages visited: {}", report.visited);
    println!(
        "  Duration: {:.1}s",
        report.duration().num_milliseconds() as f64 / 1000.0
    );
    println!();

    println!("Resource Cache:");
    println!("  Entries: {}", report.cache.entries);
    println!("  Total size: {} bytes", report.cache.total_bytes);
    println!(
        "  Hits / misses: {} / {}",
        report.cache.hits, report.cache.misses
    );
    println!();

    if let Some(skipped) = &report.skipped {
        println!("Skipped Links ({}):", skipped.total());
        println!("  External: {}", skipped.external);
        println!("  Already visited: {}", skipped.already_visited);
        println!("  Depth exceeded: {}", skipped.depth_exceeded);
        println!("  Malformed: {}", skipped.malformed);
        println!();
    }

    if !report.errors.is_empty() {
        println!("Error Summary:");
        let mut error_counts: Vec<_> = report.errors_by_kind().into_iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        for (kind, count) in error_counts {
            println!("  {}: {}", kind, count);
        }
        println!();

        println!("Pages With Errors:");
        for result in report.results.values().filter(|r| r.has_errors()) {
            println!("  {} ({})", result.url, result.errors.len());
        }
        println!();
    }

    println!("Total errors: {}", report.total_errors());
}
