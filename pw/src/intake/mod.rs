//! Adaptive intake flow
//!
//! A multi-step question sequence that decides, per answer, whether to ask
//! a clarifying follow-up, advance to the next topic, or complete.

mod depth;
mod machine;
mod topics;

pub use depth::is_sufficient;
pub use machine::{AnswerInput, IntakeError, IntakeMachine, IntakeState, IntakeStep};
pub use topics::{Topic, TopicKind, default_topics};
