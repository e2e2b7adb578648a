//! # Database Schema Module
//!
//! Two tables back the pipeline:
//! 1. `pages` - the metadata store, one row per crawled URL (upsert by url)
//! 2. `documents` - the vector store, one embedded document per URL with a
//!    fixed-width `F32_BLOB` embedding column sized to the embedding model

use crate::index::error::DbError;
use libsql::{Connection, params};
use tracing::warn;

/// Initialize the database schema for embeddings of `dimensions` floats
pub async fn initialize_schema(conn: &Connection, dimensions: usize) -> Result<(), DbError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS pages (
            url TEXT PRIMARY KEY,
            title TEXT,
            meta_description TEXT,
            meta_keywords TEXT,
            last_visited TEXT NOT NULL
        )",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create pages table: {}", e)))?;

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL UNIQUE,
                title TEXT,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding F32_BLOB({}) NOT NULL
            )",
            dimensions
        ),
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create documents table: {}", e)))?;

    // Similarity search falls back to a full scan without it
    let vector_index_result = conn
        .execute(
            "CREATE INDEX IF NOT EXISTS documents_idx ON documents (libsql_vector_idx(embedding))",
            params![],
        )
        .await;

    if let Err(e) = vector_index_result {
        warn!(error = %e, "Failed to create vector index on documents");
    }

    Ok(())
}
