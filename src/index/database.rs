//! libsql-backed metadata and vector store

use std::sync::Arc;

use chrono::{DateTime, Utc};
use libsql::{Connection, Row, params};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::crawler::Page;
use crate::index::error::DbError;
use crate::index::schema;
use crate::index::{DocumentMetadata, IndexedDocument, MetadataStore, RetrievedDocument, VectorStore};
use crate::model::embedding::EmbeddingConversion;

/// Database manager for pages and documents
///
/// One connection is shared by every clone; statements are serialized through
/// `lock` so a transaction on one task never interleaves with another task's
/// statements.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    lock: Arc<Mutex<()>>,
    dimensions: usize,
}

impl Database {
    /// Create a new database manager for embeddings of `dimensions` floats
    #[instrument(skip(conn))]
    pub async fn new(conn: Connection, dimensions: usize) -> Result<Self, DbError> {
        schema::initialize_schema(&conn, dimensions).await?;

        Ok(Self {
            conn,
            lock: Arc::new(Mutex::new(())),
            dimensions,
        })
    }

    /// Open (or create) a local database file
    pub async fn new_from_path(path: &str, dimensions: usize) -> Result<Self, DbError> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DbError::Connection(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| DbError::Connection(format!("Failed to connect to database: {}", e)))?;

        Self::new(conn, dimensions).await
    }

    /// Width of the embedding column
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Execute a custom query with parameters
    ///
    /// Rows are read to the end before the lock is released.
    pub async fn execute_query<P>(&self, sql: &str, params: P) -> Result<Vec<Row>, DbError>
    where
        P: libsql::params::IntoParams,
    {
        let _guard = self.lock.lock().await;
        let mut rows = self
            .conn
            .query(sql, params)
            .await
            .map_err(|e| DbError::Query(format!("Failed to execute query: {}", e)))?;

        let mut collected = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DbError::Data(format!("Failed to read row: {}", e)))?
        {
            collected.push(row);
        }
        Ok(collected)
    }

    /// Get a page by URL
    pub async fn get_page(&self, url: &str) -> Result<Option<Page>, DbError> {
        let _guard = self.lock.lock().await;
        let mut rows = self
            .conn
            .query(
                "SELECT url, title, meta_description, meta_keywords, last_visited
                 FROM pages
                 WHERE url = ?",
                params![url],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to get page: {}", e)))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_page(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DbError::Data(format!("Failed to get page: {}", e))),
        }
    }

    /// Number of pages in the metadata store
    pub async fn count_pages(&self) -> Result<i64, DbError> {
        self.count("SELECT COUNT(*) FROM pages", params![]).await
    }

    /// Number of documents stored for a URL (0 or 1 once upserted)
    pub async fn count_documents_for_url(&self, url: &str) -> Result<i64, DbError> {
        self.count("SELECT COUNT(*) FROM documents WHERE url = ?", params![url])
            .await
    }

    async fn count<P>(&self, sql: &str, params: P) -> Result<i64, DbError>
    where
        P: libsql::params::IntoParams,
    {
        let rows = self.execute_query(sql, params).await?;
        match rows.first() {
            Some(row) => row
                .get(0)
                .map_err(|e| DbError::Data(format!("Failed to get count: {}", e))),
            None => Ok(0),
        }
    }

    async fn upsert_document(&self, document: &IndexedDocument) -> Result<i64, DbError> {
        let metadata = serde_json::to_string(&document.metadata)?;

        let _guard = self.lock.lock().await;
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        tx.execute(
            "DELETE FROM documents WHERE url = ?",
            params![document.metadata.url.clone()],
        )
        .await
        .map_err(|e| DbError::Query(format!("Failed to delete document: {}", e)))?;

        tx.execute(
            "INSERT INTO documents (url, title, content, metadata, embedding)
             VALUES (?, ?, ?, ?, ?)",
            params![
                document.metadata.url.clone(),
                document.metadata.title.clone(),
                document.content.clone(),
                metadata,
                libsql::Value::Blob(document.embedding.to_binary()),
            ],
        )
        .await
        .map_err(|e| DbError::Query(format!("Failed to add document: {}", e)))?;

        let mut rows = tx
            .query("SELECT last_insert_rowid()", params![])
            .await
            .map_err(|e| DbError::Query(format!("Failed to get last insert ID: {}", e)))?;

        let row = match rows.next().await {
            Ok(Some(row)) => row,
            Ok(None) => {
                return Err(DbError::Data(
                    "No ID returned from last_insert_rowid()".to_string(),
                ));
            }
            Err(e) => return Err(DbError::Data(format!("Failed to get ID: {}", e))),
        };
        let id: i64 = row
            .get(0)
            .map_err(|e| DbError::Data(format!("Failed to get ID: {}", e)))?;
        drop(rows);

        tx.commit()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        Ok(id)
    }
}

impl MetadataStore for Database {
    #[instrument(skip(self, page), fields(url = %page.url))]
    async fn insert_page(&self, page: &Page) -> Result<(), DbError> {
        let _guard = self.lock.lock().await;
        self.conn
            .execute(
                "INSERT INTO pages (url, title, meta_description, meta_keywords, last_visited)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(url) DO UPDATE SET
                 title = excluded.title,
                 meta_description = excluded.meta_description,
                 meta_keywords = excluded.meta_keywords,
                 last_visited = excluded.last_visited",
                params![
                    page.url.clone(),
                    page.title.clone(),
                    page.description.clone(),
                    page.keywords.clone(),
                    page.last_visited.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to insert page: {}", e)))?;

        debug!("Stored page metadata");
        Ok(())
    }
}

impl VectorStore for Database {
    async fn add_documents(&self, documents: Vec<IndexedDocument>) -> Result<Vec<i64>, DbError> {
        let mut ids = Vec::with_capacity(documents.len());
        for document in &documents {
            ids.push(self.upsert_document(document).await?);
        }
        Ok(ids)
    }

    #[instrument(skip(self, query))]
    async fn similarity_search(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedDocument>, DbError> {
        let blob: Vec<u8> = query.iter().flat_map(|f| f.to_le_bytes()).collect();

        let rows = self
            .execute_query(
                "SELECT content, metadata, vector_distance_cos(embedding, ?) AS distance
                 FROM documents
                 ORDER BY distance ASC
                 LIMIT ?",
                params![libsql::Value::Blob(blob), k as i64],
            )
            .await?;

        let results = rows
            .iter()
            .map(row_to_retrieved)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(found = results.len(), "Similarity search finished");
        Ok(results)
    }
}

fn row_to_page(row: &Row) -> Result<Page, DbError> {
    let last_visited: String = row
        .get(4)
        .map_err(|e| DbError::Data(format!("Failed to get last_visited: {}", e)))?;
    let last_visited = DateTime::parse_from_rfc3339(&last_visited)
        .map_err(|e| DbError::Data(format!("Invalid last_visited timestamp: {}", e)))?
        .with_timezone(&Utc);

    Ok(Page {
        url: row
            .get(0)
            .map_err(|e| DbError::Data(format!("Failed to get url: {}", e)))?,
        title: row
            .get(1)
            .map_err(|e| DbError::Data(format!("Failed to get title: {}", e)))?,
        description: row
            .get(2)
            .map_err(|e| DbError::Data(format!("Failed to get meta_description: {}", e)))?,
        keywords: row
            .get(3)
            .map_err(|e| DbError::Data(format!("Failed to get meta_keywords: {}", e)))?,
        last_visited,
    })
}

fn row_to_retrieved(row: &Row) -> Result<RetrievedDocument, DbError> {
    let metadata: String = row
        .get(1)
        .map_err(|e| DbError::Data(format!("Failed to get metadata: {}", e)))?;
    let metadata: DocumentMetadata = serde_json::from_str(&metadata)?;
    let distance: f64 = row
        .get(2)
        .map_err(|e| DbError::Data(format!("Failed to get distance: {}", e)))?;

    Ok(RetrievedDocument {
        content: row
            .get(0)
            .map_err(|e| DbError::Data(format!("Failed to get content: {}", e)))?,
        metadata,
        distance: distance as f32,
    })
}
