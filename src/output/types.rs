//! Crawl result and error types
//!
//! This module defines the records a page visit produces and the error
//! taxonomy shared by the processor, the reporter and plugins.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Category of a crawl error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Bad HTTP status or a failed navigation
    Navigation,
    /// Uncaught exception raised by the visited page
    Script,
    /// Console error logged by the visited page
    Console,
    /// Failed sub-resource request
    Request,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::Script => "script",
            Self::Console => "console",
            Self::Request => "request",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a crawl error: `(kind, message, location)`
///
/// A missing location keys the same as an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorKey {
    pub kind: ErrorKind,
    pub message: String,
    pub location: String,
}

/// A structured error observed during a crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl CrawlError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: None,
            location: None,
        }
    }

    /// Creates a navigation error located at the page that failed
    pub fn navigation(message: impl Into<String>, page_url: &str) -> Self {
        Self::new(ErrorKind::Navigation, message).with_location(page_url)
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Returns the deduplication key of this error
    pub fn key(&self) -> ErrorKey {
        ErrorKey {
            kind: self.kind,
            message: self.message.clone(),
            location: self.location.clone().unwrap_or_default(),
        }
    }

    /// Returns true if both errors have the same identity
    pub fn same_identity(&self, other: &CrawlError) -> bool {
        self.kind == other.kind
            && self.message == other.message
            && self.location.as_deref().unwrap_or("") == other.location.as_deref().unwrap_or("")
    }
}

impl fmt::Display for CrawlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " ({})", location)?;
        }
        Ok(())
    }
}

/// Outcome of one page visit
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrawlResult {
    /// The visited URL
    pub url: String,

    /// Distinct errors this page produced
    pub errors: Vec<CrawlError>,

    /// Links harvested from the page, after plugin filtering
    pub links: Vec<String>,

    /// Free-form values set by the processor and plugins
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl CrawlResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Appends an error unless one with the same identity is present
    ///
    /// Returns true if the error was added.
    pub fn push_error(&mut self, error: CrawlError) -> bool {
        if self.errors.iter().any(|e| e.same_identity(&error)) {
            return false;
        }
        self.errors.push(error);
        true
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
