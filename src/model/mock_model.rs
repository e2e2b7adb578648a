//! # Mock Models for Testing
//!
//! `MockCompletionModel` returns a canned answer (or a canned failure) and
//! records every request it receives. `MockEmbeddingModel` hashes words into a
//! small fixed-width vector, so texts sharing vocabulary land close together
//! without any network access.

use rig::{
    completion::{
        AssistantContent, CompletionError, CompletionModel, CompletionRequest, CompletionResponse,
        message::{Message, UserContent},
    },
    embeddings::{Embedding, EmbeddingError, EmbeddingModel},
    one_or_many::OneOrMany,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// What the mock saw of one completion request
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Text parts of the prompt message, joined by newlines
    pub prompt: String,
    pub preamble: Option<String>,
    pub temperature: Option<f64>,
}

fn message_text(message: &Message) -> String {
    match message {
        Message::User { content, .. } => content
            .iter()
            .filter_map(|part| match part {
                UserContent::Text(text) => Some(text.text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Message::Assistant { content, .. } => content
            .iter()
            .filter_map(|part| match part {
                AssistantContent::Text(text) => Some(text.text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Empty,
    Fail(String),
}

/// A mock completion model for testing purposes.
#[derive(Debug, Clone)]
pub struct MockCompletionModel {
    reply: Arc<Mutex<MockReply>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockCompletionModel {
    fn with_reply(reply: MockReply) -> Self {
        Self {
            reply: Arc::new(Mutex::new(reply)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a mock that answers every request with `text`.
    pub fn answering(text: &str) -> Self {
        Self::with_reply(MockReply::Text(text.to_string()))
    }

    /// Creates a mock whose responses carry no text at all.
    pub fn empty() -> Self {
        Self::with_reply(MockReply::Empty)
    }

    /// Creates a mock that fails every request with a provider error.
    pub fn failing(message: &str) -> Self {
        Self::with_reply(MockReply::Fail(message.to_string()))
    }

    /// Every request seen so far, oldest first.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }
}

impl CompletionModel for MockCompletionModel {
    type Response = String;

    async fn completion(
        &self,
        completion_request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.requests.lock().await.push(RecordedRequest {
            prompt: message_text(&completion_request.prompt),
            preamble: completion_request.preamble.clone(),
            temperature: completion_request.temperature,
        });

        let reply = self.reply.lock().await.clone();
        match reply {
            MockReply::Text(text) => Ok(CompletionResponse {
                choice: OneOrMany::one(AssistantContent::text(&text)),
                raw_response: text,
            }),
            MockReply::Empty => Ok(CompletionResponse {
                choice: OneOrMany::one(AssistantContent::text("")),
                raw_response: String::new(),
            }),
            MockReply::Fail(message) => Err(CompletionError::ProviderError(message)),
        }
    }
}

pub const MOCK_DIMENSIONS: usize = 64;

/// Deterministic bag-of-words embedding model.
#[derive(Debug, Clone, Default)]
pub struct MockEmbeddingModel {
    fail: bool,
}

impl MockEmbeddingModel {
    pub fn new() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }

    pub fn embed_str(text: &str) -> Vec<f64> {
        let mut vec = vec![0.0f64; MOCK_DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .filter(|w| w.len() > 2)
        {
            let word = word.to_lowercase();
            // FNV-1a
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in word.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            vec[(hash % MOCK_DIMENSIONS as u64) as usize] += 1.0;
        }
        vec
    }
}

impl EmbeddingModel for MockEmbeddingModel {
    const MAX_DOCUMENTS: usize = 16;

    fn ndims(&self) -> usize {
        MOCK_DIMENSIONS
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        if self.fail {
            return Err(EmbeddingError::ProviderError(
                "mock embedding failure".to_string(),
            ));
        }
        Ok(texts
            .into_iter()
            .map(|text| Embedding {
                vec: Self::embed_str(&text),
                document: text,
            })
            .collect())
    }
}
