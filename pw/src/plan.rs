//! Plan generation from finished intake answers
//!
//! Consumes the FormAnswers payload emitted by the intake machine and asks
//! the LLM for a first-cut business case. The result becomes version 1 of
//! the document; failures surface to the caller so the intake UI can offer
//! a retry instead of fabricating a plan.

use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{BusinessCaseDocument, FormAnswers};
use crate::intake::Topic;
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message};
use crate::prompts;

/// Errors from plan generation
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    /// The model answered but nothing parseable came back
    #[error("No plan produced: {0}")]
    NoPlan(String),
}

/// Generates the initial business case from intake answers
pub struct PlanGenerator {
    llm: Arc<dyn LlmClient>,
    max_tokens: u32,
}

impl PlanGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        Self { llm, max_tokens }
    }

    /// Generate a business case from the finished intake payload
    pub async fn generate(&self, topics: &[Topic], answers: &FormAnswers) -> Result<BusinessCaseDocument, GenerateError> {
        debug!(answer_count = answers.len(), "generate: called");

        let answer_data: Vec<serde_json::Value> = topics
            .iter()
            .filter_map(|topic| {
                answers.get(topic.id).map(|answer| {
                    json!({
                        "question": topic.prompt,
                        "answer": answer.as_prompt_text(),
                    })
                })
            })
            .collect();

        let user_message = prompts::render(prompts::GENERATE_USER, &json!({ "answers": answer_data }))?;

        let request = CompletionRequest {
            system_prompt: prompts::GENERATE_SYSTEM.to_string(),
            messages: vec![Message::user(user_message)],
            max_tokens: self.max_tokens,
            json_response: true,
        };

        let response = self.llm.complete(request).await?;
        let content = response
            .content
            .ok_or_else(|| GenerateError::NoPlan("model returned no content".to_string()))?;

        let document = parse_document(&content)?;
        if document.is_empty() {
            return Err(GenerateError::NoPlan("model returned an empty document".to_string()));
        }

        info!(
            sections = document.populated_sections().len(),
            "generate: business case produced"
        );
        Ok(document)
    }
}

/// Parse a document out of model output, tolerating markdown code fences
fn parse_document(content: &str) -> Result<BusinessCaseDocument, GenerateError> {
    let json_text = extract_json(content);
    serde_json::from_str(json_text).map_err(|e| GenerateError::NoPlan(format!("unparseable response: {}", e)))
}

/// Strip markdown fences and any prose around the JSON object
pub(crate) fn extract_json(content: &str) -> &str {
    let fence = regex::Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```");
    if let Ok(re) = fence
        && let Some(captures) = re.captures(content)
        && let Some(inner) = captures.get(1)
    {
        return inner.as_str();
    }

    // Fall back to the outermost braces
    match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => content.trim(),
    }
}
