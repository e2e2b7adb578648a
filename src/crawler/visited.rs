//! Visited-URL tracking
//!
//! `VisitedTracker` is the single dedup authority for a crawl. The set lives
//! in memory and is mirrored line-by-line to an append-only log so it
//! survives restarts. Keys are normalized URLs, so `https://a.test/x` and
//! `https://a.test/x/` are the same page.
//!
//! Workers call `claim` before fetching: a claim succeeds only when the URL
//! is neither visited nor held by another worker, and it is released when
//! the guard drops. Marking happens while the claim is held, so a URL is
//! fetched at most once per run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

use crate::crawler::error::TrackerError;

/// Canonical dedup key for a URL.
///
/// `scheme://host[:port]/path` with a trailing slash removed; query and
/// fragment are dropped. Strings that do not parse as URLs are kept as-is
/// (trimmed) so they still dedup textually.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    let Ok(url) = Url::parse(raw) else {
        return raw.trim_end_matches('/').to_string();
    };
    let Some(host) = url.host_str() else {
        return raw.trim_end_matches('/').to_string();
    };

    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
    format!(
        "{}://{}{}{}",
        url.scheme(),
        host,
        port,
        url.path().trim_end_matches('/')
    )
}

/// Persistent set of URLs that have been fully processed
#[derive(Debug)]
pub struct VisitedTracker {
    path: PathBuf,
    visited: RwLock<HashSet<String>>,
    in_flight: Mutex<HashSet<String>>,
    log: tokio::sync::Mutex<()>,
}

impl VisitedTracker {
    /// Load the tracker from its log.
    ///
    /// A missing log starts empty. An unreadable log is logged and also
    /// starts empty: treating URLs as unvisited can only cause a refetch.
    pub async fn open(path: impl AsRef<Path>) -> Arc<Self> {
        let path = path.as_ref().to_path_buf();
        let visited = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(normalize_url)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => {
                warn!("Failed to read visited log {}: {}", path.display(), e);
                HashSet::new()
            }
        };
        info!(
            "Loaded {} visited URLs from {}",
            visited.len(),
            path.display()
        );

        Arc::new(Self {
            path,
            visited: RwLock::new(visited),
            in_flight: Mutex::new(HashSet::new()),
            log: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_visited(&self, url: &str) -> bool {
        let key = normalize_url(url);
        self.visited
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key)
    }

    pub fn len(&self) -> usize {
        self.visited
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserve a URL for processing.
    ///
    /// Returns `None` when the URL is already visited or claimed by another
    /// worker.
    pub fn claim(self: &Arc<Self>, url: &str) -> Option<VisitClaim> {
        let key = normalize_url(url);
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let visited = self
            .visited
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key);
        if visited || !in_flight.insert(key.clone()) {
            return None;
        }

        Some(VisitClaim {
            tracker: Arc::clone(self),
            key,
        })
    }

    /// Record a URL as visited and append it to the log.
    ///
    /// Idempotent: a URL already in the set is not written again.
    pub async fn mark_visited(&self, url: &str) -> Result<(), TrackerError> {
        let key = normalize_url(url);
        let _log = self.log.lock().await;

        if self
            .visited
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key)
        {
            return Ok(());
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{}\n", key).as_bytes()).await?;
        file.flush().await?;

        self.visited
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());
        debug!("Marked {} as visited", key);
        Ok(())
    }

    fn release(&self, key: &str) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Exclusive right to process one URL; released on drop
#[derive(Debug)]
pub struct VisitClaim {
    tracker: Arc<VisitedTracker>,
    key: String,
}

impl VisitClaim {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for VisitClaim {
    fn drop(&mut self) {
        self.tracker.release(&self.key);
    }
}
