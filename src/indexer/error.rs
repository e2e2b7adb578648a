//! Error types for the indexer module

use crate::error::Error as CrateError;
use crate::index::DbError;
use rig::embeddings::EmbeddingError;
use thiserror::Error;

/// Error type for indexing one page
#[derive(Debug, Error)]
pub enum IndexError {
    /// The embedding provider failed
    #[error("Embedding generation error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The embedding provider returned no vector for the content
    #[error("Embedding provider returned no embedding")]
    EmptyEmbedding,

    /// The vector store rejected the document
    #[error("Vector store error: {0}")]
    Store(#[from] DbError),
}

impl From<IndexError> for CrateError {
    fn from(err: IndexError) -> Self {
        CrateError::Index(err.to_string())
    }
}
