//! In-memory metadata and vector store.
//!
//! Brute-force cosine search over a map keyed by URL. Used by tests and by
//! dry runs that should not touch a database file.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use tokio::sync::RwLock;
use tracing::debug;

use crate::crawler::Page;
use crate::index::error::DbError;
use crate::index::{IndexedDocument, MetadataStore, RetrievedDocument, VectorStore};
use crate::model::embedding::{EmbeddingConversion, cosine_similarity};

#[derive(Debug, Clone)]
struct StoredDocument {
    id: i64,
    document: IndexedDocument,
}

/// In-memory store implementing both store traits
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pages: Arc<RwLock<HashMap<String, Page>>>,
    documents: Arc<RwLock<HashMap<String, StoredDocument>>>,
    next_id: Arc<AtomicI64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a page by URL
    pub async fn get_page(&self, url: &str) -> Option<Page> {
        self.pages.read().await.get(url).cloned()
    }

    /// URLs of every stored page
    pub async fn page_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.pages.read().await.keys().cloned().collect();
        urls.sort();
        urls
    }

    /// Documents stored for one URL
    pub async fn documents_for_url(&self, url: &str) -> Vec<IndexedDocument> {
        self.documents
            .read()
            .await
            .values()
            .filter(|stored| stored.document.metadata.url == url)
            .map(|stored| stored.document.clone())
            .collect()
    }

    /// Total number of stored documents
    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }
}

impl MetadataStore for MemoryStore {
    async fn insert_page(&self, page: &Page) -> Result<(), DbError> {
        self.pages
            .write()
            .await
            .insert(page.url.clone(), page.clone());
        Ok(())
    }
}

impl VectorStore for MemoryStore {
    async fn add_documents(&self, documents: Vec<IndexedDocument>) -> Result<Vec<i64>, DbError> {
        let mut store = self.documents.write().await;
        let mut ids = Vec::with_capacity(documents.len());
        for document in documents {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            store.insert(
                document.metadata.url.clone(),
                StoredDocument { id, document },
            );
            ids.push(id);
        }
        debug!("Upserted {} documents", ids.len());
        Ok(ids)
    }

    async fn similarity_search(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedDocument>, DbError> {
        let store = self.documents.read().await;

        let mut scored: Vec<(f32, &StoredDocument)> = store
            .values()
            .map(|stored| {
                let distance = 1.0 - cosine_similarity(query, &stored.document.embedding.to_vec());
                (distance, stored)
            })
            .collect();

        scored.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.id.cmp(&b.1.id))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(distance, stored)| RetrievedDocument {
                content: stored.document.content.clone(),
                metadata: stored.document.metadata.clone(),
                distance,
            })
            .collect())
    }
}
