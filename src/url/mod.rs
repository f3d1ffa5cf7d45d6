//! URL handling module for Site-Probe
//!
//! This module provides link normalization and the origin/depth
//! classification applied to every link a visit discovers.

mod normalize;

use url::{Origin, Url};

// Re-export main functions
pub use normalize::{normalize_start_url, normalize_url};

/// Outcome of classifying a discovered link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkClassification {
    /// Same origin and within depth: may be enqueued at `depth`
    Crawlable { url: Url, depth: u32 },
    /// Different scheme, host or port than the start URL
    External(String),
    /// Child depth would exceed the configured maximum
    DepthExceeded(String),
    /// The link could not be parsed as an absolute URL
    Malformed(String),
}

/// Returns true if `url` has the same scheme, host and port as `origin`
///
/// Opaque origins (`mailto:`, `data:`, `javascript:`) never match.
pub fn is_same_origin(url: &Url, origin: &Origin) -> bool {
    let candidate = url.origin();
    candidate.is_tuple() && &candidate == origin
}

/// Classifies a link discovered on a page at `parent_depth`
///
/// Checks run in the following order:
/// 1. Parse failure → Malformed
/// 2. Origin differs from `origin` → External
/// 3. `parent_depth + 1 > max_depth` → DepthExceeded
/// 4. Otherwise → Crawlable at `parent_depth + 1`
///
/// The visited check is left to the caller, which owns the visited set.
///
/// # Examples
///
/// ```
/// use site_probe::url::{classify_link, LinkClassification};
/// use url::Url;
///
/// let origin = Url::parse("https://example.com/").unwrap().origin();
/// let class = classify_link("https://example.com/a#top", &origin, 0, 2);
/// assert!(matches!(class, LinkClassification::Crawlable { depth: 1, .. }));
/// ```
pub fn classify_link(link: &str, origin: &Origin, parent_depth: u32, max_depth: u32) -> LinkClassification {
    let url = match normalize_url(link) {
        Ok(url) => url,
        Err(_) => return LinkClassification::Malformed(link.to_string()),
    };

    if !is_same_origin(&url, origin) {
        return LinkClassification::External(url.to_string());
    }

    let depth = parent_depth.saturating_add(1);
    if depth > max_depth {
        return LinkClassification::DepthExceeded(url.to_string());
    }

    LinkClassification::Crawlable { url, depth }
}
