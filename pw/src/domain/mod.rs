//! Domain types for Planwright
//!
//! The document model, its section keys, and the intake answer payload.

mod answers;
mod document;

pub use answers::{Answer, FormAnswers, TopicId};
pub use document::{BusinessCaseDocument, SectionKey, SolutionPillar};
