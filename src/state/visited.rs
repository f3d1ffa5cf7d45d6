/// Visited set of normalized URLs
///
/// A URL enters the set at most once and is never removed. The scheduler
/// owns the set exclusively, so `insert` doubles as the check-then-mark step
/// that prevents scheduling the same URL twice.
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Marks a URL visited
    ///
    /// Returns `false` if the URL was already present, in which case the
    /// caller must not launch a visit for it.
    pub fn insert(&mut self, url: &str) -> bool {
        if self.urls.contains(url) {
            return false;
        }
        self.urls.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_once() {
        let mut visited = VisitedSet::new();
        assert!(visited.insert("https://example.com/"));
        assert!(!visited.insert("https://example.com/"));
        assert_eq!(visited.len(), 1);
        assert!(visited.contains("https://example.com/"));
    }

    #[test]
    fn test_distinct_urls() {
        let mut visited = VisitedSet::new();
        visited.insert("https://example.com/a");
        visited.insert("https://example.com/b");
        assert_eq!(visited.len(), 2);
        assert!(!visited.contains("https://example.com/c"));

        let mut urls: Vec<&str> = visited.iter().collect();
        urls.sort();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
    }
}
