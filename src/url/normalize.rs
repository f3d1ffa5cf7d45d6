use crate::UrlError;
use url::Url;

/// Normalizes a discovered link for frontier and visited-set membership
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Parse the URL; reject if malformed
/// 3. Remove fragment (everything after #)
///
/// Nothing else is rewritten: scheme, host case, path and query are kept as
/// the parser produces them, so two links only collide when they address the
/// same document.
///
/// # Examples
///
/// ```
/// use site_probe::url::normalize_url;
///
/// let url = normalize_url("https://example.com/docs#install").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?;
    url.set_fragment(None);
    Ok(url)
}

/// Normalizes the crawl's start URL
///
/// Unlike discovered links, the start URL must name a host so that an origin
/// can be derived for same-site filtering.
pub fn normalize_start_url(url_str: &str) -> Result<Url, UrlError> {
    let url = normalize_url(url_str)?;

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost(url_str.to_string()));
    }

    Ok(url)
}
