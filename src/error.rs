//! Error types for the sitesage crate

use thiserror::Error;

/// Result type for sitesage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sitesage operations
///
/// Each component owns a narrower error enum; they all fold into this one
/// at the crate boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Network or HTTP failure while fetching one page
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Malformed document content
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Embedding or vector store failure while indexing one page
    #[error("Index error: {0}")]
    Index(String),

    /// Similarity search failure while answering
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Model call failure or malformed completion
    #[error("Completion error: {0}")]
    Completion(String),

    /// Missing or invalid external configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Metadata or vector store error
    #[error("Database error: {0}")]
    Database(String),

    /// Visited-URL log I/O error
    #[error("Tracker error: {0}")]
    Tracker(String),

    /// Socket bind or serve failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::crawler::FetchError;
    use crate::index::DbError;
    use crate::search::AnswerError;

    fn load_key() -> Result<String> {
        let key: std::result::Result<String, ConfigError> =
            Err(ConfigError::Missing("OPENAI_API_KEY"));
        Ok(key?)
    }

    fn answer(err: AnswerError) -> Result<String> {
        let reply: std::result::Result<String, AnswerError> = Err(err);
        Ok(reply?)
    }

    #[test]
    fn test_config_error_folds_into_configuration() {
        let err = load_key().unwrap_err();
        assert!(matches!(err, Error::Configuration(ref msg) if msg.contains("OPENAI_API_KEY")));
    }

    #[test]
    fn test_answer_errors_keep_their_kind() {
        let err = answer(AnswerError::Retrieval("index offline".to_string())).unwrap_err();
        assert!(matches!(err, Error::Retrieval(ref msg) if msg == "index offline"));

        let err = answer(AnswerError::Completion("quota exceeded".to_string())).unwrap_err();
        assert!(matches!(err, Error::Completion(ref msg) if msg == "quota exceeded"));
    }

    #[test]
    fn test_component_errors_fold() {
        let err: Error = FetchError::Status {
            url: "https://example.test/".to_string(),
            status: 503,
        }
        .into();
        assert!(matches!(err, Error::Fetch(ref msg) if msg.contains("503")));

        let err: Error = DbError::Data("disk full".to_string()).into();
        assert!(matches!(err, Error::Database(_)));

        let err: Error = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "I/O error: port taken");
    }
}
