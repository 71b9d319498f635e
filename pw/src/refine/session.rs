//! AI-assisted refinement proposals
//!
//! A RefinementSession turns a natural-language instruction plus the
//! current document into an ephemeral partial-document proposal. The
//! proposal carries only the sections the model claims to have changed;
//! persistence is the caller's job, after review.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{BusinessCaseDocument, SectionKey};
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message};
use crate::plan::extract_json;
use crate::prompts;

/// A partial document keyed by section, carrying complete new values
pub type PartialDocument = BTreeMap<SectionKey, Value>;

/// Errors from a refinement exchange
#[derive(Debug, Error)]
pub enum RefineError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    /// The model answered but proposed nothing usable
    #[error("No changes proposed: {0}")]
    NoChanges(String),
}

/// One proposed revision, pending review
#[derive(Debug, Clone)]
pub struct RefinementProposal {
    /// Only the sections the model changed, full replacement values
    pub refined_content: PartialDocument,
    /// Exactly the key set of refined_content
    pub affected_sections: Vec<SectionKey>,
    pub changes_summary: String,
}

/// Envelope the model is instructed to respond with. A bare partial
/// document (no envelope) is also accepted.
#[derive(Debug, Deserialize)]
struct RefineEnvelope {
    refined_content: serde_json::Map<String, Value>,
    #[serde(default)]
    changes_summary: Option<String>,
}

/// Drives one instruction -> proposal exchange against the LLM
pub struct RefinementSession {
    llm: Arc<dyn LlmClient>,
    max_tokens: u32,
}

impl RefinementSession {
    pub fn new(llm: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        Self { llm, max_tokens }
    }

    /// Propose a revision of `current` according to `instruction`
    ///
    /// `history` carries earlier instruction/summary turns from the same
    /// session so the model sees what it already changed. The returned
    /// proposal is ephemeral; nothing is written anywhere.
    pub async fn propose(
        &self,
        current: &BusinessCaseDocument,
        instruction: &str,
        focus: Option<SectionKey>,
        history: &[Message],
    ) -> Result<RefinementProposal, RefineError> {
        debug!(focus = ?focus, history_turns = history.len(), "propose: called");

        let document_json = serde_json::to_string_pretty(current)
            .map_err(|e| RefineError::NoChanges(format!("document not serializable: {}", e)))?;
        let system_prompt = prompts::render(
            prompts::REFINE_SYSTEM,
            &json!({
                "document": document_json,
                "focus_section": focus.map(|s| s.as_str()),
            }),
        )?;

        let mut messages = history.to_vec();
        messages.push(Message::user(instruction.to_string()));

        let request = CompletionRequest {
            system_prompt,
            messages,
            max_tokens: self.max_tokens,
            json_response: true,
        };

        let response = self.llm.complete(request).await?;
        let content = response
            .content
            .ok_or_else(|| RefineError::NoChanges("model returned no content".to_string()))?;

        let (raw_sections, changes_summary) = parse_proposal(&content)?;
        let refined_content = sanitize_sections(raw_sections);
        if refined_content.is_empty() {
            return Err(RefineError::NoChanges(
                "model proposed no recognizable sections".to_string(),
            ));
        }

        let affected_sections: Vec<SectionKey> = refined_content.keys().copied().collect();
        let changes_summary = changes_summary.unwrap_or_else(|| summarize(&affected_sections));

        info!(
            sections = affected_sections.len(),
            summary = %changes_summary,
            "propose: revision ready for review"
        );
        Ok(RefinementProposal {
            refined_content,
            affected_sections,
            changes_summary,
        })
    }
}

/// Parse the model output into raw section map plus optional summary
///
/// Accepts the instructed envelope or, when the model skips it, a bare
/// partial document.
fn parse_proposal(content: &str) -> Result<(serde_json::Map<String, Value>, Option<String>), RefineError> {
    let json_text = extract_json(content);

    if let Ok(envelope) = serde_json::from_str::<RefineEnvelope>(json_text) {
        return Ok((envelope.refined_content, envelope.changes_summary));
    }

    match serde_json::from_str::<serde_json::Map<String, Value>>(json_text) {
        Ok(bare) => Ok((bare, None)),
        Err(e) => Err(RefineError::NoChanges(format!("unparseable response: {}", e))),
    }
}

/// Keep only known section keys with non-null values
fn sanitize_sections(raw: serde_json::Map<String, Value>) -> PartialDocument {
    let mut sections = PartialDocument::new();
    for (key, value) in raw {
        let Some(section) = SectionKey::parse(&key) else {
            warn!(key = %key, "dropping unknown section from proposal");
            continue;
        };
        if value.is_null() {
            warn!(section = %section, "dropping null section from proposal");
            continue;
        }
        sections.insert(section, value);
    }
    sections
}

/// Fallback summary when the model omits one
fn summarize(affected: &[SectionKey]) -> String {
    let names: Vec<&str> = affected.iter().map(|s| s.heading()).collect();
    format!("Updated {}", names.join(", "))
}
