//! Document refinement
//!
//! One propose/review/accept cycle: the AI proposes a partial document,
//! the diff is reviewed section by section, and acceptance merges it into
//! a new immutable version. Nothing persists until the user accepts.

mod diff;
mod session;

pub use diff::{SectionDiff, diff, resolve};
pub use session::{PartialDocument, RefineError, RefinementProposal, RefinementSession};
