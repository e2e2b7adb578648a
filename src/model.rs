//! # LLM Client Module
//!
//! This module provides the provider capability set used by the pipeline: one
//! completion model and one embedding model, both rate limited.
//!
//! ## Key Components
//!
//! - `Client`: wraps a completion model and an embedding model behind one handle
//! - `RateLimitedCompletionModel` / `RateLimitedEmbeddingModel`: governor-backed wrappers
//! - `EmbeddingConversion`: conversions between rig embeddings, `f32` vectors and blobs
//!
//! Providers are strategies chosen once at startup (`openai_client`,
//! `gemini_client`); call sites stay generic over `CompletionModel` and
//! `EmbeddingModel`, so a new provider never touches them.

use std::num::NonZeroU32;

use governor::{Quota, RateLimiter};
use ratelimited_completion::RateLimitedCompletionModel;
use ratelimited_embedding::RateLimitedEmbeddingModel;
use rig::{
    completion::CompletionModel,
    embeddings::EmbeddingModel,
    providers::{gemini, openai},
};

pub mod embedding;
#[cfg(test)]
pub mod mock_model;
pub mod ratelimited_completion;
pub mod ratelimited_embedding;

pub use embedding::EmbeddingConversion;

const OPENAI_COMPLETION_MODEL: &str = "gpt-4o-mini";
const GEMINI_COMPLETION_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone)]
pub struct Client<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    completion_model: C,
    embedding_model: E,
}

impl<C, E> Client<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    /// Pair an arbitrary completion model with an arbitrary embedding model
    pub fn new(completion_model: C, embedding_model: E) -> Self {
        Self {
            completion_model,
            embedding_model,
        }
    }

    pub fn completion(&self) -> &C {
        &self.completion_model
    }

    pub fn embedding(&self) -> &E {
        &self.embedding_model
    }
}

fn per_minute(limit: u32) -> Quota {
    Quota::per_minute(NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN))
}

/// OpenAI-backed capability set
pub fn openai_client(
    api_key: &str,
) -> Client<impl CompletionModel + 'static, impl EmbeddingModel + 'static> {
    let openai_client = openai::Client::new(api_key);
    let completion_model = RateLimitedCompletionModel::new(
        openai_client.completion_model(OPENAI_COMPLETION_MODEL),
        RateLimiter::direct(per_minute(500)),
    );
    let embedding_model = RateLimitedEmbeddingModel::new(
        openai_client.embedding_model(openai::TEXT_EMBEDDING_3_SMALL),
        RateLimiter::direct(per_minute(1000)),
    );
    Client::new(completion_model, embedding_model)
}

/// Gemini-backed capability set
pub fn gemini_client(
    api_key: &str,
) -> Client<impl CompletionModel + 'static, impl EmbeddingModel + 'static> {
    let gemini_client = gemini::Client::new(api_key);
    let completion_model = RateLimitedCompletionModel::new(
        gemini_client.completion_model(GEMINI_COMPLETION_MODEL),
        RateLimiter::direct(per_minute(2000)),
    );
    let embedding_model = RateLimitedEmbeddingModel::new(
        gemini_client.embedding_model(gemini::embedding::EMBEDDING_004),
        RateLimiter::direct(per_minute(1000)),
    );
    Client::new(completion_model, embedding_model)
}
