/// Frontier of work items waiting to be visited
///
/// Items are appended to a growing backlog and read through a cursor that
/// never rewinds, so adding work while the crawl is draining the backlog is
/// O(1) amortized and nothing is ever removed from the middle.
use std::fmt;

/// A URL scheduled for a visit at a given link depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Normalized URL to visit
    pub url: String,

    /// Link distance from the start URL (the start URL is 0)
    pub depth: u32,
}

impl WorkItem {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (depth {})", self.url, self.depth)
    }
}

/// Ordered backlog of work items with a monotonic read cursor
#[derive(Debug, Default)]
pub struct Frontier {
    items: Vec<WorkItem>,
    cursor: usize,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends items to the end of the backlog, preserving their order
    pub fn add(&mut self, items: impl IntoIterator<Item = WorkItem>) {
        self.items.extend(items);
    }

    /// Returns the item at the cursor and advances past it
    ///
    /// Returns `None` once every added item has been handed out.
    pub fn next_item(&mut self) -> Option<WorkItem> {
        let item = self.items.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(item)
    }

    /// Returns true if at least one item has not been handed out yet
    pub fn has_work(&self) -> bool {
        self.cursor < self.items.len()
    }

    /// Number of items not handed out yet
    pub fn len(&self) -> usize {
        self.items.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        !self.has_work()
    }

    /// Number of items ever added
    pub fn total(&self) -> usize {
        self.items.len()
    }
}
