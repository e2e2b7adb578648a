//! Prompt construction and answer configuration

use crate::index::RetrievedDocument;

/// Wraps the question for retrieval; `{question}` is substituted
pub const DEFAULT_RETRIEVAL_TEMPLATE: &str = "Search for documents that can give granular information on this question. Question: '{question}'";

/// Stuffed-context prompt; `{context}` and `{question}` are substituted
pub const DEFAULT_PROMPT_TEMPLATE: &str = "Use the following pieces of context to answer the question at the end. If you don't know the answer, just say that you don't know, don't try to make up an answer.

{context}

Question: {question}
Helpful Answer:";

/// Answer configuration
#[derive(Debug, Clone)]
pub struct AnswerConfig {
    /// Number of documents retrieved per question
    pub top_k: usize,

    /// Template turning a question into a retrieval query
    pub retrieval_template: String,

    /// Template for the final prompt
    pub prompt_template: String,

    /// Operator instruction prefixed to the question
    pub instruction: Option<String>,

    /// Sampling temperature for the completion model
    pub temperature: f64,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            retrieval_template: DEFAULT_RETRIEVAL_TEMPLATE.to_string(),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            instruction: None,
            temperature: 0.8,
        }
    }
}

/// Builder for AnswerConfig
#[derive(Debug, Default)]
pub struct AnswerConfigBuilder {
    config: AnswerConfig,
}

impl AnswerConfigBuilder {
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.config.top_k = top_k;
        self
    }

    pub fn retrieval_template(mut self, template: impl Into<String>) -> Self {
        self.config.retrieval_template = template.into();
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = template.into();
        self
    }

    pub fn instruction(mut self, instruction: Option<String>) -> Self {
        self.config.instruction = instruction;
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn build(self) -> AnswerConfig {
        self.config
    }
}

impl AnswerConfig {
    pub fn builder() -> AnswerConfigBuilder {
        AnswerConfigBuilder::default()
    }

    pub fn retrieval_query(&self, question: &str) -> String {
        render_template(&self.retrieval_template, "", question)
    }

    /// The question as the model sees it, with the instruction prefix
    pub fn model_question(&self, question: &str) -> String {
        match &self.instruction {
            Some(instruction) => format!(
                "{}. Question: '{}'",
                instruction.trim().trim_end_matches('.'),
                question
            ),
            None => question.to_string(),
        }
    }

    /// Stuff the retrieved documents into the prompt template
    pub fn build_prompt(&self, documents: &[RetrievedDocument], question: &str) -> String {
        let context = documents
            .iter()
            .map(|doc| doc.content.trim())
            .filter(|content| !content.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        render_template(
            &self.prompt_template,
            &context,
            &self.model_question(question),
        )
    }
}

/// Substitute `{context}` and `{question}` in one pass.
///
/// Substituted text is never rescanned, so placeholders inside page content
/// or questions are left alone.
pub fn render_template(template: &str, context: &str, question: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len() + question.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{context}") {
            out.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{question}") {
            out.push_str(question);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
