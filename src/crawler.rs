//! # Website Crawler Module for RAG
//!
//! This module gathers the raw material of the pipeline: it walks a fixed
//! allowlist of domains to a shallow depth, turns every fetched page into a
//! `Page` record plus normalized markdown, and hands both to the stores and
//! the indexer.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: allowlist, depth, page budget, fan-out and noise tags
//! - `Fetcher` / `HttpFetcher`: retrieves one document over HTTP
//! - `Extractor`: pure HTML to `Page` + markdown transform
//! - `VisitedTracker`: the dedup authority, mirrored to an append-only log
//! - `Crawler`: the orchestrator driving one traversal per seed
//!
//! A URL is marked visited only after its metadata is stored and its content
//! indexed (or found empty). Anything that fails earlier stays eligible for a
//! later run.

mod config;
mod error;
pub mod extract;
pub mod fetch;
mod orchestrator;
pub mod visited;

pub use config::{CrawlerConfig, CrawlerConfigBuilder};
pub use error::{CrawlError, ExtractionError, FetchError, TrackerError};
pub use extract::{ExtractedPage, Extractor, normalize_markdown};
pub use fetch::{FetchedDocument, Fetcher, HttpFetcher};
pub use orchestrator::{CrawlSummary, Crawler};
pub use visited::{VisitedTracker, normalize_url};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One crawled URL, as persisted in the metadata store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Normalized absolute URL; the upsert key
    pub url: String,

    /// Text of the first `<title>` element
    pub title: Option<String>,

    /// Content of `<meta name="description">`
    pub description: Option<String>,

    /// Content of `<meta name="keywords">`
    pub keywords: Option<String>,

    /// When the page was successfully processed
    pub last_visited: DateTime<Utc>,
}
