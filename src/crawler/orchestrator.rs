//! Crawl orchestration
//!
//! One traversal per seed, all running concurrently and joined before
//! `crawl` returns. Each traversal walks breadth-first to `max_depth`,
//! processing up to `concurrency` pages of a level at once. Per-page work is
//! fetch, extract, store metadata, index content, then mark visited; a
//! failure at any step is logged and leaves the URL unvisited.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use rig::{completion::CompletionModel, embeddings::EmbeddingModel};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::context::RagContext;
use crate::crawler::config::CrawlerConfig;
use crate::crawler::error::{CrawlError, ExtractionError};
use crate::crawler::extract::{ExtractedPage, Extractor};
use crate::crawler::fetch::Fetcher;
use crate::crawler::visited::{VisitedTracker, normalize_url};
use crate::index::{MetadataStore, VectorStore};
use crate::indexer::{IndexInput, Indexer};

/// Counters for a finished crawl
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Pages stored and indexed
    pub indexed: usize,
    /// Pages stored with no indexable content
    pub empty: usize,
    /// Already-visited seeds fetched only to follow their links
    pub revisited: usize,
    /// Pages that failed and remain unvisited
    pub failed: usize,
    /// URLs skipped as already claimed or over the page budget
    pub skipped: usize,
}

impl CrawlSummary {
    pub fn processed(&self) -> usize {
        self.indexed + self.empty
    }

    fn merge(&mut self, other: CrawlSummary) {
        self.indexed += other.indexed;
        self.empty += other.empty;
        self.revisited += other.revisited;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }

    /// Count an outcome and hand back the links it discovered
    fn record(&mut self, outcome: Outcome) -> Vec<Url> {
        match outcome {
            Outcome::Indexed(links) => {
                self.indexed += 1;
                links
            }
            Outcome::Empty(links) => {
                self.empty += 1;
                links
            }
            Outcome::Revisited(links) => {
                self.revisited += 1;
                links
            }
            Outcome::Skipped => {
                self.skipped += 1;
                Vec::new()
            }
            Outcome::Failed => {
                self.failed += 1;
                Vec::new()
            }
        }
    }
}

#[derive(Debug)]
enum Outcome {
    Indexed(Vec<Url>),
    Empty(Vec<Url>),
    Revisited(Vec<Url>),
    Skipped,
    Failed,
}

fn parse_seed(seed: &str) -> Option<Url> {
    let seed = seed.trim();
    if seed.contains("://") {
        Url::parse(seed).ok()
    } else {
        Url::parse(&format!("https://{}", seed)).ok()
    }
}

/// Drives traversals over the shared stores
pub struct Crawler<F, E, S> {
    fetcher: F,
    extractor: Extractor,
    indexer: Indexer<E, S>,
    store: S,
    tracker: Arc<VisitedTracker>,
    config: CrawlerConfig,
    fetched: AtomicU32,
}

impl<F, E, S> Crawler<F, E, S>
where
    F: Fetcher,
    E: EmbeddingModel + 'static,
    S: MetadataStore + VectorStore,
{
    pub fn new<C: CompletionModel>(
        ctx: &RagContext<C, E, S>,
        fetcher: F,
        tracker: Arc<VisitedTracker>,
        config: CrawlerConfig,
    ) -> Result<Self, ExtractionError> {
        Ok(Self {
            fetcher,
            extractor: Extractor::new(&config.remove_tags)?,
            indexer: Indexer::from_context(ctx),
            store: ctx.store.clone(),
            tracker,
            config,
            fetched: AtomicU32::new(0),
        })
    }

    pub fn tracker(&self) -> &Arc<VisitedTracker> {
        &self.tracker
    }

    /// Crawl every seed concurrently and wait for all traversals to finish.
    ///
    /// The page budget is per call; calls on one crawler must not overlap.
    pub async fn crawl(self: &Arc<Self>, seeds: Vec<String>) -> CrawlSummary {
        info!("Starting crawl of {} seeds", seeds.len());
        self.fetched.store(0, Ordering::SeqCst);
        let mut tasks = JoinSet::new();
        for seed in seeds {
            let crawler = Arc::clone(self);
            tasks.spawn(async move { crawler.traverse(seed).await });
        }

        let mut summary = CrawlSummary::default();
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(traversal) => summary.merge(traversal),
                Err(e) => error!("Traversal task failed: {}", e),
            }
        }

        info!(
            indexed = summary.indexed,
            empty = summary.empty,
            failed = summary.failed,
            skipped = summary.skipped,
            "Crawl finished"
        );
        summary
    }

    #[instrument(skip(self))]
    async fn traverse(&self, seed: String) -> CrawlSummary {
        let mut summary = CrawlSummary::default();
        let Some(seed_url) = parse_seed(&seed) else {
            warn!("Ignoring unparseable seed");
            summary.failed += 1;
            return summary;
        };

        let mut queued = HashSet::from([normalize_url(seed_url.as_str())]);
        let mut level = vec![seed_url];
        let mut depth = 0;

        while !level.is_empty() {
            debug!("Processing {} URLs at depth {}", level.len(), depth);
            let mut pending = level.into_iter();
            let mut running = FuturesUnordered::new();
            let mut next = Vec::new();

            loop {
                while running.len() < self.config.concurrency {
                    match pending.next() {
                        Some(url) => running.push(self.process(url, depth)),
                        None => break,
                    }
                }
                let Some(outcome) = running.next().await else {
                    break;
                };

                let links = summary.record(outcome);
                if depth >= self.config.max_depth {
                    continue;
                }
                for link in links {
                    if self.should_follow(&link) && queued.insert(normalize_url(link.as_str())) {
                        next.push(link);
                    }
                }
            }

            level = next;
            depth += 1;
        }

        summary
    }

    fn should_follow(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| self.config.allows_host(host))
            && !self.tracker.is_visited(url.as_str())
    }

    fn take_budget(&self) -> bool {
        self.fetched.fetch_add(1, Ordering::SeqCst) < self.config.max_pages
    }

    async fn process(&self, url: Url, depth: u32) -> Outcome {
        let Some(_claim) = self.tracker.claim(url.as_str()) else {
            if depth == 0 && self.tracker.is_visited(url.as_str()) {
                return self.revisit(url).await;
            }
            debug!("Skipping {}: already visited or in flight", url);
            return Outcome::Skipped;
        };

        if !self.take_budget() {
            debug!("Skipping {}: page budget exhausted", url);
            return Outcome::Skipped;
        }

        match self.process_claimed(&url).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Failed to process {}: {}", url, e);
                Outcome::Failed
            }
        }
    }

    /// Fetch a visited seed only to rediscover its links
    async fn revisit(&self, url: Url) -> Outcome {
        if !self.take_budget() {
            return Outcome::Skipped;
        }
        let links: Result<Vec<Url>, CrawlError> = match self.fetcher.fetch(&url).await {
            Ok(fetched) => self
                .extractor
                .extract(&fetched)
                .map(|page| page.links)
                .map_err(CrawlError::from),
            Err(e) => Err(e.into()),
        };
        match links {
            Ok(links) => Outcome::Revisited(links),
            Err(e) => {
                warn!("Failed to revisit seed {}: {}", url, e);
                Outcome::Failed
            }
        }
    }

    async fn process_claimed(&self, url: &Url) -> Result<Outcome, CrawlError> {
        let fetched = self.fetcher.fetch(url).await?;
        let ExtractedPage {
            page,
            content,
            links,
        } = self.extractor.extract(&fetched)?;

        self.store.insert_page(&page).await?;

        let outcome = if content.is_empty() {
            info!("No content on {}, stored metadata only", page.url);
            Outcome::Empty(links)
        } else {
            self.indexer
                .index(IndexInput {
                    content,
                    title: page.title.clone(),
                    url: page.url.clone(),
                })
                .await?;
            info!("Indexed {}", page.url);
            Outcome::Indexed(links)
        };

        self.tracker.mark_visited(url.as_str()).await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::error::FetchError;
    use crate::crawler::fetch::FetchedDocument;
    use crate::index::MemoryStore;
    use crate::model::Client;
    use crate::model::mock_model::{MockCompletionModel, MockEmbeddingModel};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Default)]
    struct FakeFetcher {
        pages: Arc<HashMap<String, String>>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl FakeFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: Arc::new(
                    pages
                        .iter()
                        .map(|(url, html)| (url.to_string(), html.to_string()))
                        .collect(),
                ),
                requests: Arc::default(),
            }
        }

        fn requests(&self) -> Vec<String> {
            let mut requests = self.requests.lock().unwrap().clone();
            requests.sort();
            requests
        }
    }

    impl Fetcher for FakeFetcher {
        async fn fetch(&self, url: &Url) -> Result<FetchedDocument, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.pages.get(url.as_str()) {
                Some(html) => Ok(FetchedDocument {
                    url: url.clone(),
                    final_url: url.clone(),
                    html: html.clone(),
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    struct Harness {
        crawler: Arc<Crawler<FakeFetcher, MockEmbeddingModel, MemoryStore>>,
        fetcher: FakeFetcher,
        store: MemoryStore,
        tracker: Arc<VisitedTracker>,
        _dir: TempDir,
    }

    async fn harness_with(
        pages: &[(&str, &str)],
        embedding: MockEmbeddingModel,
        configure: impl FnOnce(crate::crawler::CrawlerConfigBuilder) -> crate::crawler::CrawlerConfigBuilder,
        visited: &[&str],
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let config = configure(
            CrawlerConfig::builder()
                .allowed_domains(vec!["example.test".to_string()])
                .max_depth(1)
                .visited_log(dir.path().join("visited.txt")),
        )
        .build();

        let tracker = VisitedTracker::open(&config.visited_log).await;
        for url in visited {
            tracker.mark_visited(url).await.unwrap();
        }

        let store = MemoryStore::new();
        let ctx = RagContext::new(
            Client::new(MockCompletionModel::answering("unused"), embedding),
            store.clone(),
        );
        let fetcher = FakeFetcher::new(pages);
        let crawler = Crawler::new(&ctx, fetcher.clone(), tracker.clone(), config).unwrap();

        Harness {
            crawler: Arc::new(crawler),
            fetcher,
            store,
            tracker,
            _dir: dir,
        }
    }

    async fn harness(pages: &[(&str, &str)]) -> Harness {
        harness_with(pages, MockEmbeddingModel::new(), |b| b, &[]).await
    }

    const HOME: &str = r#"<html><head><title>Home</title></head><body>
        <p>Welcome to Example College</p>
        <a href="https://example.test/about">About</a>
        <a href="https://other.test/">Elsewhere</a>
    </body></html>"#;

    const ABOUT: &str = r#"<html><head><title>About</title>
        <meta name="description" content="About the college"></head>
        <body><p>We offer a 30-day refund window.</p><a href="/deeper">Deeper</a></body></html>"#;

    #[tokio::test]
    async fn test_crawl_stays_on_allowed_domains() {
        let h = harness(&[("https://example.test/", HOME), ("https://example.test/about", ABOUT)]).await;

        let summary = h.crawler.crawl(vec!["https://example.test/".to_string()]).await;

        assert_eq!(summary.indexed, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(
            h.fetcher.requests(),
            vec!["https://example.test/", "https://example.test/about"]
        );
        assert_eq!(
            h.store.page_urls().await,
            vec!["https://example.test", "https://example.test/about"]
        );
        let about = h.store.get_page("https://example.test/about").await.unwrap();
        assert_eq!(about.title.as_deref(), Some("About"));
        assert_eq!(about.description.as_deref(), Some("About the college"));
        assert!(h.tracker.is_visited("https://example.test/"));
        assert!(h.tracker.is_visited("https://example.test/about"));
        assert_eq!(h.store.document_count().await, 2);
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let h = harness_with(
            &[
                ("https://example.test/", HOME),
                ("https://example.test/about", ABOUT),
                ("https://example.test/deeper", "<p>deep</p>"),
            ],
            MockEmbeddingModel::new(),
            |b| b.max_depth(0),
            &[],
        )
        .await;

        let summary = h.crawler.crawl(vec!["https://example.test/".to_string()]).await;

        assert_eq!(summary.indexed, 1);
        assert_eq!(h.fetcher.requests(), vec!["https://example.test/"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_continues() {
        let home = r#"<body><p>Home</p>
            <a href="/missing">Missing</a>
            <a href="/about">About</a></body>"#;
        let h = harness(&[("https://example.test/", home), ("https://example.test/about", ABOUT)]).await;

        let summary = h.crawler.crawl(vec!["https://example.test/".to_string()]).await;

        assert_eq!(summary.indexed, 2);
        assert_eq!(summary.failed, 1);
        assert!(h.tracker.is_visited("https://example.test/about"));
        assert!(!h.tracker.is_visited("https://example.test/missing"));
        assert!(h.store.get_page("https://example.test/missing").await.is_none());
    }

    #[tokio::test]
    async fn test_visited_urls_not_refetched() {
        let h = harness_with(
            &[("https://example.test/", HOME), ("https://example.test/about", ABOUT)],
            MockEmbeddingModel::new(),
            |b| b,
            &["https://example.test/about/"],
        )
        .await;

        let summary = h.crawler.crawl(vec!["https://example.test".to_string()]).await;

        assert_eq!(summary.indexed, 1);
        assert_eq!(h.fetcher.requests(), vec!["https://example.test/"]);
    }

    #[tokio::test]
    async fn test_visited_seed_is_expanded_not_reindexed() {
        let h = harness_with(
            &[("https://example.test/", HOME), ("https://example.test/about", ABOUT)],
            MockEmbeddingModel::new(),
            |b| b,
            &["https://example.test"],
        )
        .await;

        let summary = h.crawler.crawl(vec!["https://example.test/".to_string()]).await;

        assert_eq!(summary.revisited, 1);
        assert_eq!(summary.indexed, 1);
        assert!(h.store.get_page("https://example.test").await.is_none());
        assert!(h.store.get_page("https://example.test/about").await.is_some());
    }

    #[tokio::test]
    async fn test_shared_link_fetched_once() {
        let page = r#"<body><p>News</p><a href="/shared">Shared</a></body>"#;
        let h = harness_with(
            &[
                ("https://example.test/", page),
                ("https://example.test/news", page),
                ("https://example.test/shared", "<p>shared page</p>"),
            ],
            MockEmbeddingModel::new(),
            |b| b.concurrency(4),
            &[],
        )
        .await;

        let summary = h
            .crawler
            .crawl(vec![
                "https://example.test/".to_string(),
                "https://example.test/news".to_string(),
            ])
            .await;

        let shared_fetches = h
            .fetcher
            .requests()
            .iter()
            .filter(|r| r.ends_with("/shared"))
            .count();
        assert_eq!(shared_fetches, 1);
        assert_eq!(summary.indexed, 3);
        assert_eq!(h.store.document_count().await, 3);
    }

    #[tokio::test]
    async fn test_fan_out_processes_every_link() {
        let home = r#"<body><p>Index</p>
            <a href="/a">A</a><a href="/b">B</a><a href="/c">C</a><a href="/d">D</a></body>"#;
        let h = harness_with(
            &[
                ("https://example.test/", home),
                ("https://example.test/a", "<p>alpha</p>"),
                ("https://example.test/b", "<p>bravo</p>"),
                ("https://example.test/c", "<p>charlie</p>"),
                ("https://example.test/d", "<p>delta</p>"),
            ],
            MockEmbeddingModel::new(),
            |b| b.concurrency(3),
            &[],
        )
        .await;

        let summary = h.crawler.crawl(vec!["https://example.test/".to_string()]).await;

        assert_eq!(summary.indexed, 5);
        assert_eq!(h.fetcher.requests().len(), 5);
        assert_eq!(h.tracker.len(), 5);
    }

    #[tokio::test]
    async fn test_empty_page_stored_not_indexed() {
        let blank = r#"<html><head><title>Blank</title></head>
            <body><script>track()</script></body></html>"#;
        let h = harness(&[("https://example.test/", blank)]).await;

        let summary = h.crawler.crawl(vec!["https://example.test/".to_string()]).await;

        assert_eq!(summary.empty, 1);
        assert_eq!(summary.processed(), 1);
        let page = h.store.get_page("https://example.test").await.unwrap();
        assert_eq!(page.title.as_deref(), Some("Blank"));
        assert_eq!(h.store.document_count().await, 0);
        assert!(h.tracker.is_visited("https://example.test/"));
    }

    #[tokio::test]
    async fn test_index_failure_leaves_url_unvisited() {
        let h = harness_with(
            &[("https://example.test/", "<p>content</p>")],
            MockEmbeddingModel::failing(),
            |b| b,
            &[],
        )
        .await;

        let summary = h.crawler.crawl(vec!["https://example.test/".to_string()]).await;

        assert_eq!(summary.failed, 1);
        assert!(h.store.get_page("https://example.test").await.is_some());
        assert_eq!(h.store.document_count().await, 0);
        assert!(!h.tracker.is_visited("https://example.test/"));
    }

    #[tokio::test]
    async fn test_page_budget() {
        let h = harness_with(
            &[("https://example.test/", HOME), ("https://example.test/about", ABOUT)],
            MockEmbeddingModel::new(),
            |b| b.max_pages(1),
            &[],
        )
        .await;

        let summary = h.crawler.crawl(vec!["https://example.test/".to_string()]).await;

        assert_eq!(summary.indexed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(h.fetcher.requests(), vec!["https://example.test/"]);
        assert!(!h.tracker.is_visited("https://example.test/about"));
    }

    #[tokio::test]
    async fn test_page_budget_resets_per_crawl() {
        let h = harness_with(
            &[("https://example.test/", HOME), ("https://example.test/about", ABOUT)],
            MockEmbeddingModel::new(),
            |b| b.max_pages(1),
            &[],
        )
        .await;

        let first = h.crawler.crawl(vec!["https://example.test/".to_string()]).await;
        assert_eq!(first.indexed, 1);

        let second = h
            .crawler
            .crawl(vec!["https://example.test/about".to_string()])
            .await;
        assert_eq!(second.indexed, 1);
        assert!(h.tracker.is_visited("https://example.test/about"));
    }

    #[tokio::test]
    async fn test_offsite_redirect_not_indexed() {
        let mut allowed = mockito::Server::new_async().await;
        let mut offsite = mockito::Server::new_async().await;
        let offsite_url = format!("http://localhost:{}/", offsite.socket_address().port());

        let _redirect = allowed
            .mock("GET", "/")
            .with_status(302)
            .with_header("location", &offsite_url)
            .create_async()
            .await;
        let offsite_page = offsite
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<p>offsite content</p>")
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = CrawlerConfig::builder()
            .allowed_domains(vec!["127.0.0.1".to_string()])
            .visited_log(dir.path().join("visited.txt"))
            .build();
        let tracker = VisitedTracker::open(&config.visited_log).await;
        let store = MemoryStore::new();
        let ctx = RagContext::new(
            Client::new(
                MockCompletionModel::answering("unused"),
                MockEmbeddingModel::new(),
            ),
            store.clone(),
        );
        let fetcher = crate::crawler::HttpFetcher::new(&config).unwrap();
        let crawler = Arc::new(Crawler::new(&ctx, fetcher, tracker.clone(), config).unwrap());

        let seed = format!("{}/", allowed.url());
        let summary = crawler.crawl(vec![seed.clone()]).await;

        assert_eq!(summary.indexed, 0);
        assert_eq!(summary.failed, 1);
        assert_eq!(store.document_count().await, 0);
        assert!(store.page_urls().await.is_empty());
        assert!(!tracker.is_visited(&seed));
        offsite_page.assert_async().await;
    }

    #[test]
    fn test_parse_seed() {
        assert_eq!(
            parse_seed("conestogac.on.ca").unwrap().as_str(),
            "https://conestogac.on.ca/"
        );
        assert_eq!(
            parse_seed("http://example.test/x").unwrap().as_str(),
            "http://example.test/x"
        );
        assert!(parse_seed("https://").is_none());
    }
}
