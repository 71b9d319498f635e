//! Planwright - conversational business-plan intake and versioned refinement
//!
//! Planwright turns a short free-text business idea into a structured
//! business-case document through an adaptive question flow, then lets the
//! user refine that document with natural-language instructions. Every
//! accepted change is persisted as an immutable version in [`planstore`].
//!
//! # Core Concepts
//!
//! - **Adaptive intake**: each answer is depth-checked; thin answers get a
//!   follow-up prompt instead of an error, bounded by the topic's follow-up
//!   list so the flow can never stall
//! - **Proposals are ephemeral**: the AI proposes a partial document; nothing
//!   is persisted until the user accepts the reviewed diff
//! - **History is additive**: restore appends the old content as a new
//!   version rather than rewinding
//!
//! # Modules
//!
//! - [`intake`] - depth evaluation, topics, and the intake state machine
//! - [`domain`] - document model, section keys, and intake answers
//! - [`refine`] - refinement session and section-level diff review
//! - [`plan`] - plan generation from finished intake answers
//! - [`llm`] - LLM client trait and OpenAI implementation
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod intake;
pub mod llm;
pub mod plan;
pub mod prompts;
pub mod refine;

// Re-export commonly used types
pub use config::{Config, LlmConfig, StorageConfig};
pub use domain::{Answer, BusinessCaseDocument, FormAnswers, SectionKey, SolutionPillar, TopicId};
pub use intake::{
    AnswerInput, IntakeError, IntakeMachine, IntakeState, IntakeStep, Topic, TopicKind, default_topics, is_sufficient,
};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, OpenAIClient, create_client};
pub use plan::{GenerateError, PlanGenerator};
pub use refine::{
    PartialDocument, RefineError, RefinementProposal, RefinementSession, SectionDiff, diff, resolve,
};
