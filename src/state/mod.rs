//! State module for tracking crawl progress
//!
//! This module provides the per-crawl bookkeeping owned by the scheduler loop.
//!
//! # Components
//!
//! - `Frontier`: Ordered backlog of `WorkItem`s with a monotonic read cursor
//! - `VisitedSet`: URLs already scheduled or completed
//! - `SkipLedger`: Optional diagnostics about links that were not followed

mod frontier;
mod skip_ledger;
mod visited;

// Re-export main types
pub use frontier::{Frontier, WorkItem};
pub use skip_ledger::{SkipCounts, SkipLedger, SkipReason};
pub use visited::VisitedSet;
