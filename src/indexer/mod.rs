//! Indexer module for RAG
//!
//! Turns the markdown of one page into an embedded document and upserts it
//! into the vector store. One page is one document; re-indexing a URL
//! replaces what was stored for it.

mod error;

pub use error::IndexError;

use rig::{completion::CompletionModel, embeddings::EmbeddingModel};
use tracing::{debug, instrument};

use crate::context::RagContext;
use crate::index::{DocumentMetadata, IndexedDocument, VectorStore};

/// Content and provenance of one page, ready for embedding
#[derive(Debug, Clone)]
pub struct IndexInput {
    pub content: String,
    pub title: Option<String>,
    pub url: String,
}

/// Embeds page content and writes it to the vector store
#[derive(Debug, Clone)]
pub struct Indexer<E, S> {
    embedding_model: E,
    store: S,
}

impl<E, S> Indexer<E, S>
where
    E: EmbeddingModel,
    S: VectorStore,
{
    pub fn new(embedding_model: E, store: S) -> Self {
        Self {
            embedding_model,
            store,
        }
    }

    pub fn from_context<C: CompletionModel>(ctx: &RagContext<C, E, S>) -> Self {
        Self::new(ctx.client.embedding().clone(), ctx.store.clone())
    }

    /// Embed and store one page. Empty content is skipped.
    #[instrument(skip(self, input), fields(url = %input.url))]
    pub async fn index(&self, input: IndexInput) -> Result<(), IndexError> {
        if input.content.trim().is_empty() {
            debug!("Skipping empty content");
            return Ok(());
        }

        let embedding = self
            .embedding_model
            .embed_texts(vec![input.content.clone()])
            .await?
            .into_iter()
            .next()
            .filter(|e| !e.vec.is_empty())
            .ok_or(IndexError::EmptyEmbedding)?;

        let document = IndexedDocument {
            content: input.content,
            metadata: DocumentMetadata {
                title: input.title,
                url: input.url,
            },
            embedding,
        };

        let ids = self.store.add_documents(vec![document]).await?;
        debug!("Indexed document {:?}", ids);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryStore;
    use crate::model::mock_model::MockEmbeddingModel;

    fn input(url: &str, content: &str) -> IndexInput {
        IndexInput {
            content: content.to_string(),
            title: Some("Refunds".to_string()),
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn test_index_stores_document() {
        let store = MemoryStore::new();
        let indexer = Indexer::new(MockEmbeddingModel::new(), store.clone());

        indexer
            .index(input("https://example.test/refunds", "30-day refund window"))
            .await
            .unwrap();

        let docs = store.documents_for_url("https://example.test/refunds").await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "30-day refund window");
        assert_eq!(docs[0].metadata.title.as_deref(), Some("Refunds"));
        assert_eq!(
            docs[0].embedding.vec,
            MockEmbeddingModel::embed_str("30-day refund window")
        );
    }

    #[tokio::test]
    async fn test_reindex_replaces() {
        let store = MemoryStore::new();
        let indexer = Indexer::new(MockEmbeddingModel::new(), store.clone());
        let url = "https://example.test/refunds";

        indexer.index(input(url, "old policy")).await.unwrap();
        indexer.index(input(url, "new policy")).await.unwrap();

        let docs = store.documents_for_url(url).await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "new policy");
        assert_eq!(store.document_count().await, 1);
    }

    #[tokio::test]
    async fn test_empty_content_skipped() {
        let store = MemoryStore::new();
        let indexer = Indexer::new(MockEmbeddingModel::failing(), store.clone());

        indexer
            .index(input("https://example.test/blank", "  \n "))
            .await
            .unwrap();

        assert_eq!(store.document_count().await, 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_surfaces() {
        let store = MemoryStore::new();
        let indexer = Indexer::new(MockEmbeddingModel::failing(), store.clone());

        let result = indexer
            .index(input("https://example.test/refunds", "30-day refund window"))
            .await;

        assert!(matches!(result, Err(IndexError::Embedding(_))));
        assert_eq!(store.document_count().await, 0);
    }
}
