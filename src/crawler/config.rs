//! # Crawler Configuration Module
//!
//! Load-time constants for the crawl: which domains may be followed, how deep,
//! how many pages at most, how much fan-out per traversal, and which noise
//! elements are stripped from page bodies before conversion. Built with a
//! builder, never mutated once a crawl starts.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Host substrings a discovered link must match to be followed
    pub allowed_domains: Vec<String>,

    /// Maximum link depth from a seed (seed is depth 0)
    pub max_depth: u32,

    /// Maximum number of pages fetched across the whole crawl
    pub max_pages: u32,

    /// Pages fetched in parallel within one traversal
    pub concurrency: usize,

    /// User agent to use for requests
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Tag names removed from the body before markdown conversion
    pub remove_tags: Vec<String>,

    /// Append-only log of visited URLs
    pub visited_log: PathBuf,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            allowed_domains: vec!["conestogac.on.ca".to_string()],
            max_depth: 1,
            max_pages: 500,
            concurrency: 1,
            user_agent: format!("sitesage/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
            remove_tags: vec![
                "script".to_string(),
                "noscript".to_string(),
                "style".to_string(),
            ],
            visited_log: PathBuf::from("visited_urls.txt"),
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the allowed domains
    pub fn allowed_domains(mut self, allowed_domains: Vec<String>) -> Self {
        self.config.allowed_domains = allowed_domains;
        self
    }

    /// Set the maximum depth to crawl
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Set the maximum number of pages to crawl
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Set the per-traversal fan-out (clamped to at least 1)
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the per-request timeout in seconds
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// Set the tag names stripped from page bodies
    pub fn remove_tags(mut self, remove_tags: Vec<String>) -> Self {
        self.config.remove_tags = remove_tags;
        self
    }

    /// Set the path of the visited-URL log
    pub fn visited_log(mut self, visited_log: impl Into<PathBuf>) -> Self {
        self.config.visited_log = visited_log.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Whether a host matches the allowlist (substring match)
    pub fn allows_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.allowed_domains
            .iter()
            .any(|domain| !domain.is_empty() && host.contains(&domain.to_ascii_lowercase()))
    }
}
