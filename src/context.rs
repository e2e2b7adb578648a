//! Shared pipeline context
//!
//! Built once at startup and handed by reference to the crawler, the indexer
//! and the answerer. Holds the provider capability set and the store.

use rig::{completion::CompletionModel, embeddings::EmbeddingModel};

use crate::model::Client;

#[derive(Debug, Clone)]
pub struct RagContext<C, E, S>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    pub client: Client<C, E>,
    pub store: S,
}

impl<C, E, S> RagContext<C, E, S>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    pub fn new(client: Client<C, E>, store: S) -> Self {
        Self { client, store }
    }
}
