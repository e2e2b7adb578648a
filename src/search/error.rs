//! # Answer Error Types
//!
//! Failures while answering a question. The detailed message is for logs;
//! `public_message` is what a client may see.

use thiserror::Error;

use crate::error::Error as CrateError;

/// Errors that can occur while answering a question
#[derive(Debug, Error)]
pub enum AnswerError {
    /// Query embedding or similarity search failed
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// The model call failed or produced no text
    #[error("Completion error: {0}")]
    Completion(String),
}

impl AnswerError {
    /// Message safe to return to API clients
    pub fn public_message(&self) -> &'static str {
        match self {
            AnswerError::Retrieval(_) => "failed to search the knowledge base",
            AnswerError::Completion(_) => "failed to generate an answer",
        }
    }
}

impl From<AnswerError> for CrateError {
    fn from(err: AnswerError) -> Self {
        match err {
            AnswerError::Retrieval(msg) => CrateError::Retrieval(msg),
            AnswerError::Completion(msg) => CrateError::Completion(msg),
        }
    }
}
