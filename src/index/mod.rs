//! Index module for RAG
//!
//! This module owns the two shared stores of the pipeline: the metadata
//! store (one `Page` row per crawled URL) and the vector store (one embedded
//! document per URL). Both are reached through the `MetadataStore` and
//! `VectorStore` traits so the crawler, indexer and answerer never name a
//! concrete backend.

mod database;
pub mod error;
mod memory;
mod schema;

use std::future::Future;

pub use database::Database;
pub use error::DbError;
pub use memory::MemoryStore;
use rig::embeddings::Embedding;
use serde::{Deserialize, Serialize};

use crate::crawler::Page;

/// Metadata stored alongside every indexed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Title of the source page
    pub title: Option<String>,

    /// Source URL; the upsert key of the vector store
    pub url: String,
}

/// A unit of embeddable content derived from one page
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    /// Normalized markdown body of the page
    pub content: String,

    /// Title and URL of the page
    pub metadata: DocumentMetadata,

    /// Vector representation of `content`
    pub embedding: Embedding,
}

/// A document returned by similarity search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub content: String,
    pub metadata: DocumentMetadata,
    /// Cosine distance to the query; lower is closer
    pub distance: f32,
}

/// Persists page metadata, upserting by URL
pub trait MetadataStore: Clone + Send + Sync + 'static {
    fn insert_page(&self, page: &Page) -> impl Future<Output = Result<(), DbError>> + Send;
}

/// Stores embedded documents and answers nearest-neighbour queries
pub trait VectorStore: Clone + Send + Sync + 'static {
    /// Upsert documents keyed by `metadata.url`, returning their row ids
    fn add_documents(
        &self,
        documents: Vec<IndexedDocument>,
    ) -> impl Future<Output = Result<Vec<i64>, DbError>> + Send;

    /// Return up to `k` documents nearest to `query`, closest first
    fn similarity_search(
        &self,
        query: &[f32],
        k: usize,
    ) -> impl Future<Output = Result<Vec<RetrievedDocument>, DbError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_metadata_json() {
        let metadata = DocumentMetadata {
            title: Some("Home".to_string()),
            url: "https://example.test".to_string(),
        };

        let json = serde_json::to_string(&metadata).unwrap();
        assert_eq!(json, r#"{"title":"Home","url":"https://example.test"}"#);

        let back: DocumentMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }

    #[test]
    fn test_document_metadata_without_title() {
        let back: DocumentMetadata =
            serde_json::from_str(r#"{"title":null,"url":"https://example.test/about"}"#).unwrap();
        assert!(back.title.is_none());
        assert_eq!(back.url, "https://example.test/about");
    }
}
