//! # Question Answering Module for RAG
//!
//! This module is the "retrieval + generation" half of the pipeline. A
//! question is rewritten into a retrieval query, embedded, matched against
//! the vector store, and the top documents are stuffed into a single prompt
//! for the completion model.
//!
//! ## Key Components
//!
//! - `Answerer`: runs one question through retrieval and completion
//! - `AnswerConfig`: top-k, templates, instruction prefix and temperature
//! - `AnswerError`: retrieval or completion failure, with a client-safe message
//!
//! An empty store is not an error: the model is still asked, with an empty
//! context.

mod error;
mod search_impl;

pub use error::AnswerError;
pub use search_impl::{
    AnswerConfig, DEFAULT_PROMPT_TEMPLATE, DEFAULT_RETRIEVAL_TEMPLATE, render_template,
};

use rig::{
    completion::{AssistantContent, CompletionModel},
    embeddings::EmbeddingModel,
    one_or_many::OneOrMany,
};
use tracing::{debug, info, instrument};

use crate::context::RagContext;
use crate::index::{RetrievedDocument, VectorStore};
use crate::model::{Client, EmbeddingConversion};

/// Answers questions from the indexed corpus
#[derive(Debug, Clone)]
pub struct Answerer<C, E, S>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    client: Client<C, E>,
    store: S,
    config: AnswerConfig,
}

impl<C, E, S> Answerer<C, E, S>
where
    C: CompletionModel,
    E: EmbeddingModel,
    S: VectorStore,
{
    pub fn new(ctx: &RagContext<C, E, S>, config: AnswerConfig) -> Self {
        Self {
            client: ctx.client.clone(),
            store: ctx.store.clone(),
            config,
        }
    }

    pub fn config(&self) -> &AnswerConfig {
        &self.config
    }

    /// Answer one question. `session_id` only labels the request in logs.
    #[instrument(skip(self, question), fields(session_id = %session_id))]
    pub async fn answer(&self, question: &str, session_id: &str) -> Result<String, AnswerError> {
        let documents = self.retrieve(question).await?;
        info!("Retrieved {} documents", documents.len());

        let prompt = self.config.build_prompt(&documents, question);
        let request = self
            .client
            .completion()
            .completion_request(prompt)
            .temperature(self.config.temperature)
            .build();

        let response = self
            .client
            .completion()
            .completion(request)
            .await
            .map_err(|e| AnswerError::Completion(e.to_string()))?;

        let answer = answer_text(&response.choice);
        if answer.is_empty() {
            return Err(AnswerError::Completion(
                "model returned no text".to_string(),
            ));
        }
        Ok(answer)
    }

    /// Fetch the documents nearest to a question
    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedDocument>, AnswerError> {
        let query = self.config.retrieval_query(question);
        debug!("Retrieval query: {}", query);

        let embedding = self
            .client
            .embedding()
            .embed_texts(vec![query])
            .await
            .map_err(|e| AnswerError::Retrieval(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| AnswerError::Retrieval("no embedding for query".to_string()))?;

        self.store
            .similarity_search(&embedding.to_vec(), self.config.top_k)
            .await
            .map_err(|e| AnswerError::Retrieval(e.to_string()))
    }
}

/// Concatenate the text parts of a completion
fn answer_text(choice: &OneOrMany<AssistantContent>) -> String {
    choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
