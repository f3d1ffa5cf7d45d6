//! HTML parser for the HTTP page fetcher
//!
//! This module handles parsing a loaded document to extract:
//! - Anchor targets, resolved the way a browser exposes `a.href`
//! - Sub-resources a browser would load (stylesheets, scripts, preloads, icons)

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Selectors for sub-resources loaded while a page settles
const SUBRESOURCE_SELECTORS: &[(&str, &str)] = &[
    (r#"link[rel~="stylesheet"][href]"#, "href"),
    (r#"link[rel~="preload"][href]"#, "href"),
    (r#"link[rel~="modulepreload"][href]"#, "href"),
    (r#"link[rel~="icon"][href]"#, "href"),
    ("script[src]", "src"),
];

/// Extracts every anchor target from an HTML document
///
/// # Resolution Rules
///
/// - Relative hrefs resolve against `<base href>` if present, else `base_url`
/// - Fragments are kept; the scheduler strips them during normalization
/// - `mailto:`, `javascript:` and other schemes are returned as-is, the
///   scheduler classifies them by origin
/// - An href that cannot be resolved is returned raw so it can be
///   classified as malformed
/// - Empty hrefs are dropped
///
/// # Example
///
/// ```
/// use site_probe::crawler::extract_anchor_hrefs;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = extract_anchor_hrefs(html, &base_url);
/// assert_eq!(links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn extract_anchor_hrefs(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let base = document_base(&document, base_url);

    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(|href| match base.join(href) {
            Ok(resolved) => resolved.to_string(),
            Err(_) => href.to_string(),
        })
        .collect()
}

/// Extracts the HTTP(S) sub-resources a browser would load for a document
///
/// Duplicates are removed; document order is preserved.
pub fn extract_subresources(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let base = document_base(&document, base_url);

    let mut seen = HashSet::new();
    let mut resources = Vec::new();

    for (selector, attr) in SUBRESOURCE_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };

        for element in document.select(&selector) {
            let Some(value) = element.value().attr(attr) else {
                continue;
            };

            let Ok(resolved) = base.join(value.trim()) else {
                continue;
            };

            if resolved.scheme() != "http" && resolved.scheme() != "https" {
                continue;
            }

            let resolved = resolved.to_string();
            if seen.insert(resolved.clone()) {
                resources.push(resolved);
            }
        }
    }

    resources
}

/// Returns the base URL for resolving relative references
fn document_base(document: &Html, base_url: &Url) -> Url {
    let Ok(selector) = Selector::parse("base[href]") else {
        return base_url.clone();
    };

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| base_url.join(href.trim()).ok())
        .unwrap_or_else(|| base_url.clone())
}
