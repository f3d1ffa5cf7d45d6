//! Error reporter
//!
//! The reporter is the single deduplication authority for crawl errors.
//! Deduplication is crawl-wide: the crawler clears the reporter when a crawl
//! starts and never between page visits, so an error shared by many pages is
//! announced to the operator once and counted once in the crawl total.

use crate::output::types::{CrawlError, ErrorKey};
use parking_lot::Mutex;
use std::collections::HashSet;

#[derive(Debug, Default)]
struct ReporterState {
    seen: HashSet<ErrorKey>,
    errors: Vec<CrawlError>,
}

/// Deduplicating sink for crawl errors
#[derive(Debug, Default)]
pub struct ErrorReporter {
    state: Mutex<ReporterState>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error observed on `page_url`
    ///
    /// The first report of an identity stores the error and logs a
    /// diagnostic. Later reports of the same identity are no-ops.
    ///
    /// # Returns
    ///
    /// * `true` - The error was new and has been stored
    /// * `false` - An error with the same identity was already stored
    pub fn report(&self, error: &CrawlError, page_url: &str) -> bool {
        {
            let mut state = self.state.lock();
            if !state.seen.insert(error.key()) {
                return false;
            }
            state.errors.push(error.clone());
        }

        tracing::error!("{}", format_diagnostic(error, page_url));
        true
    }

    /// Returns a snapshot of every distinct error reported so far
    pub fn errors(&self) -> Vec<CrawlError> {
        self.state.lock().errors.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every stored error and identity
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.seen.clear();
        state.errors.clear();
    }
}

/// Formats the operator-facing diagnostic for an error
///
/// The first line names the kind, page and message; stack and location
/// follow on their own lines when present.
pub fn format_diagnostic(error: &CrawlError, page_url: &str) -> String {
    let mut out = format!("{} error on {}: {}", error.kind, page_url, error.message);

    if let Some(stack) = error.stack.as_deref().filter(|s| !s.is_empty()) {
        for line in stack.lines() {
            out.push_str("\n    ");
            out.push_str(line.trim());
        }
    }

    if let Some(location) = error.location.as_deref().filter(|l| !l.is_empty()) {
        out.push_str("\n    at ");
        out.push_str(location);
    }

    out
}
