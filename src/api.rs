//! # Ask API
//!
//! HTTP surface of the answerer: a single `POST /api/v1/ask` endpoint
//! accepting a question and a session id and returning the answer in a
//! `{status, message}` envelope.

pub mod handlers;
pub mod models;

use std::sync::Arc;

use axum::{Router, routing::post};
use rig::{completion::CompletionModel, embeddings::EmbeddingModel};

use crate::index::VectorStore;
use crate::search::Answerer;

pub fn create_router<C, E, S>(answerer: Arc<Answerer<C, E, S>>) -> Router
where
    C: CompletionModel + 'static,
    E: EmbeddingModel + 'static,
    S: VectorStore,
{
    Router::new()
        .route("/api/v1/ask", post(handlers::ask_handler::<C, E, S>))
        .route("/api/v1/ask/", post(handlers::ask_handler::<C, E, S>))
        .with_state(answerer)
}
