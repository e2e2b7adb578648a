//! Error types for the crawler module

use crate::error::Error as CrateError;
use crate::index::DbError;
use crate::indexer::IndexError;
use thiserror::Error;

/// Failure to retrieve one document
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP client error (connection, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    /// Response is not an HTML document
    #[error("{url} is not HTML (content-type: {content_type})")]
    NotHtml { url: String, content_type: String },

    /// Redirect to a host outside the allowlist
    #[error("{url} redirects off the allowlist to {location}")]
    OffsiteRedirect { url: String, location: String },
}

/// Malformed document content
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// A configured removal tag is not a valid selector
    #[error("Invalid selector '{0}'")]
    Selector(String),

    /// HTML to markdown conversion failed
    #[error("Markdown conversion failed: {0}")]
    Markdown(#[from] std::io::Error),
}

/// Visited-URL log I/O error
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Visited log I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error for processing one page; the crawl itself never fails on these
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Metadata store error: {0}")]
    Store(#[from] DbError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

impl From<FetchError> for CrateError {
    fn from(err: FetchError) -> Self {
        CrateError::Fetch(err.to_string())
    }
}

impl From<ExtractionError> for CrateError {
    fn from(err: ExtractionError) -> Self {
        CrateError::Extraction(err.to_string())
    }
}

impl From<TrackerError> for CrateError {
    fn from(err: TrackerError) -> Self {
        CrateError::Tracker(err.to_string())
    }
}
