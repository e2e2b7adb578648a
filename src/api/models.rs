use serde::{Deserialize, Serialize};

pub const MAX_QUESTION_CHARS: usize = 200;
pub const MAX_SESSION_ID_CHARS: usize = 20;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(alias = "sessionID")]
    pub session_id: String,
}

impl AskRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("question is required".to_string());
        }
        if self.question.chars().count() > MAX_QUESTION_CHARS {
            return Err(format!(
                "question must be at most {} characters",
                MAX_QUESTION_CHARS
            ));
        }
        if self.session_id.trim().is_empty() {
            return Err("session_id is required".to_string());
        }
        if self.session_id.chars().count() > MAX_SESSION_ID_CHARS {
            return Err(format!(
                "session_id must be at most {} characters",
                MAX_SESSION_ID_CHARS
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AskStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub status: AskStatus,
    pub message: String,
}

impl AskResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: AskStatus::Success,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: AskStatus::Failed,
            message: message.into(),
        }
    }
}
