//! Output module for crawl results, errors and reports
//!
//! This module handles:
//! - The per-page `CrawlResult` and the `CrawlError` taxonomy
//! - Crawl-wide error deduplication (`ErrorReporter`)
//! - The aggregate `CrawlReport` and its console rendering

mod report;
mod reporter;
mod types;

pub use report::{print_report, CrawlReport};
pub use reporter::{format_diagnostic, ErrorReporter};
pub use types::{CrawlError, CrawlResult, ErrorKey, ErrorKind};
