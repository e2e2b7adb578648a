//! # sitesage - Crawl, Index and Ask over a Fixed Set of Websites
//!
//! This crate implements a small Retrieval-Augmented Generation pipeline: it
//! crawls an allowlist of domains, stores page metadata, embeds page content
//! into a libsql vector index, and answers natural-language questions by
//! stuffing the nearest documents into a completion prompt.
//!
//! ## Features
//!
//! - Shallow, allowlisted crawling with a durable visited-URL log
//! - HTML to markdown extraction with configurable noise removal
//! - Vector indexing with LibSQL, one document per page
//! - Question answering with OpenAI or Gemini models through rig
//! - A JSON Ask endpoint served with axum
//!
//! ## Example
//!
//! ```rust,no_run
//! use sitesage::context::RagContext;
//! use sitesage::index::Database;
//! use sitesage::model::openai_client;
//! use sitesage::search::{AnswerConfig, Answerer};
//! use rig::embeddings::EmbeddingModel;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = openai_client("your-api-key");
//!     let db = Database::new_from_path("sitesage.db", client.embedding().ndims()).await?;
//!     let ctx = RagContext::new(client, db);
//!
//!     let answerer = Answerer::new(&ctx, AnswerConfig::default());
//!     let answer = answerer.answer("What is the refund policy?", "example").await?;
//!
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
mod error;
pub mod model;

// RAG feature modules
pub mod api;
pub mod crawler;
pub mod index;
pub mod indexer;
pub mod search;

pub use error::Error;

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
}
