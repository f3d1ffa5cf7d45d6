/// Diagnostic ledger of links the scheduler declined to visit
///
/// The ledger keeps four disjoint sets. A URL is filed under the first
/// reason it is skipped for; later skips of the same URL are ignored.
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Why a discovered link was not visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Different origin than the start URL
    External,
    /// Already scheduled or completed
    AlreadyVisited,
    /// Child depth exceeds the configured maximum
    DepthExceeded,
    /// Could not be parsed as an absolute URL
    Malformed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::External => "external",
            Self::AlreadyVisited => "already visited",
            Self::DepthExceeded => "depth exceeded",
            Self::Malformed => "malformed",
        };
        f.write_str(label)
    }
}

/// Per-reason counts of a skip ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub external: usize,
    pub already_visited: usize,
    pub depth_exceeded: usize,
    pub malformed: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.external + self.already_visited + self.depth_exceeded + self.malformed
    }
}

#[derive(Debug, Default)]
pub struct SkipLedger {
    enabled: bool,
    external: BTreeSet<String>,
    already_visited: BTreeSet<String>,
    depth_exceeded: BTreeSet<String>,
    malformed: BTreeSet<String>,
}

impl SkipLedger {
    /// Creates a ledger; a disabled ledger ignores every record call
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Files `url` under `reason` unless it is already filed anywhere
    pub fn record(&mut self, reason: SkipReason, url: &str) {
        if !self.enabled || self.contains(url) {
            return;
        }

        tracing::trace!("Skipping {} link: {}", reason, url);
        self.set_mut(reason).insert(url.to_string());
    }

    pub fn contains(&self, url: &str) -> bool {
        self.external.contains(url)
            || self.already_visited.contains(url)
            || self.depth_exceeded.contains(url)
            || self.malformed.contains(url)
    }

    pub fn urls(&self, reason: SkipReason) -> impl Iterator<Item = &str> {
        self.set(reason).iter().map(String::as_str)
    }

    pub fn counts(&self) -> SkipCounts {
        SkipCounts {
            external: self.external.len(),
            already_visited: self.already_visited.len(),
            depth_exceeded: self.depth_exceeded.len(),
            malformed: self.malformed.len(),
        }
    }

    fn set(&self, reason: SkipReason) -> &BTreeSet<String> {
        match reason {
            SkipReason::External => &self.external,
            SkipReason::AlreadyVisited => &self.already_visited,
            SkipReason::DepthExceeded => &self.depth_exceeded,
            SkipReason::Malformed => &self.malformed,
        }
    }

    fn set_mut(&mut self, reason: SkipReason) -> &mut BTreeSet<String> {
        match reason {
            SkipReason::External => &mut self.external,
            SkipReason::AlreadyVisited => &mut self.already_visited,
            SkipReason::DepthExceeded => &mut self.depth_exceeded,
            SkipReason::Malformed => &mut self.malformed,
        }
    }
}
