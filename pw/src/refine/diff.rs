//! Section-level diff review
//!
//! Pure helpers over a document and a proposed partial document. Arrays
//! are compared as whole-array replacement: business-plan content does not
//! benefit from line-level diffing, so the before and after lists are
//! shown side by side instead.

use serde_json::Value;
use tracing::warn;

use crate::domain::{BusinessCaseDocument, SectionKey};

use super::session::PartialDocument;

/// The field-level difference for one section
#[derive(Debug, Clone, PartialEq)]
pub struct SectionDiff {
    pub section: SectionKey,
    /// Current value, None when the section is absent today
    pub original: Option<Value>,
    /// Proposed replacement value
    pub proposed: Value,
}

impl SectionDiff {
    /// Whether the proposal actually changes anything for this section
    pub fn is_change(&self) -> bool {
        self.original.as_ref() != Some(&self.proposed)
    }
}

/// Compute one SectionDiff per key present in the proposal
///
/// Keys absent from the proposal never appear, regardless of what the
/// original contains. Total over all inputs.
pub fn diff(original: &BusinessCaseDocument, proposal: &PartialDocument) -> Vec<SectionDiff> {
    proposal
        .iter()
        .map(|(section, proposed)| SectionDiff {
            section: *section,
            original: original.section(*section),
            proposed: proposed.clone(),
        })
        .collect()
}

/// Resolve a reviewed proposal into a document
///
/// Accept merges every proposed section over the original (shallow: each
/// accepted section fully replaces its counterpart, optional extension
/// fields included). Reject returns the original untouched. All-or-nothing
/// across the whole proposal.
pub fn resolve(original: &BusinessCaseDocument, proposal: &PartialDocument, accept: bool) -> BusinessCaseDocument {
    if !accept {
        return original.clone();
    }

    let mut merged = original.clone();
    for (section, value) in proposal {
        if let Err(e) = merged.set_section(*section, value) {
            // A malformed section value cannot corrupt the merge; the
            // section keeps its original content
            warn!(section = %section, error = %e, "skipping malformed proposed section");
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn original() -> BusinessCaseDocument {
        BusinessCaseDocument {
            problem_statement: Some("Orders are tracked by hand".to_string()),
            objectives: vec!["Reduce errors".to_string()],
            ..Default::default()
        }
    }

    fn proposal(entries: Vec<(SectionKey, Value)>) -> PartialDocument {
        entries.into_iter().collect::<BTreeMap<_, _>>()
    }

    #[test]
    fn test_diff_covers_exactly_proposed_keys() {
        let prop = proposal(vec![
            (SectionKey::ProblemStatement, json!("Orders are lost weekly")),
            (SectionKey::NextSteps, json!(["Pick a vendor"])),
        ]);

        let diffs = diff(&original(), &prop);
        assert_eq!(diffs.len(), 2);

        let sections: Vec<SectionKey> = diffs.iter().map(|d| d.section).collect();
        assert!(sections.contains(&SectionKey::ProblemStatement));
        assert!(sections.contains(&SectionKey::NextSteps));
        // Objectives exists in the original but was not proposed
        assert!(!sections.contains(&SectionKey::Objectives));
    }

    #[test]
    fn test_diff_carries_original_and_proposed_values() {
        let prop = proposal(vec![(SectionKey::ProblemStatement, json!("New statement"))]);
        let diffs = diff(&original(), &prop);

        assert_eq!(diffs[0].original, Some(json!("Orders are tracked by hand")));
        assert_eq!(diffs[0].proposed, json!("New statement"));
        assert!(diffs[0].is_change());
    }

    #[test]
    fn test_diff_for_previously_absent_section() {
        let prop = proposal(vec![(SectionKey::RiskAssessment, json!("Vendor lock-in"))]);
        let diffs = diff(&original(), &prop);

        assert_eq!(diffs[0].original, None);
        assert_eq!(diffs[0].proposed, json!("Vendor lock-in"));
    }

    #[test]
    fn test_diff_empty_proposal_is_empty() {
        assert!(diff(&original(), &PartialDocument::new()).is_empty());
    }

    #[test]
    fn test_resolve_accept_merges_shallow() {
        // {a:1, b:2} with proposal {b:3} yields {a:1, b:3}
        let prop = proposal(vec![(SectionKey::Objectives, json!(["Ship faster"]))]);
        let merged = resolve(&original(), &prop, true);

        assert_eq!(merged.objectives, vec!["Ship faster"]);
        assert_eq!(merged.problem_statement.as_deref(), Some("Orders are tracked by hand"));
    }

    #[test]
    fn test_resolve_reject_returns_original_untouched() {
        let prop = proposal(vec![(SectionKey::Objectives, json!(["Ship faster"]))]);
        let kept = resolve(&original(), &prop, false);
        assert_eq!(kept, original());
    }

    #[test]
    fn test_resolve_accept_replaces_arrays_wholesale() {
        let prop = proposal(vec![(
            SectionKey::Objectives,
            json!(["Entirely new objective", "Second objective"]),
        )]);
        let merged = resolve(&original(), &prop, true);
        assert_eq!(merged.objectives, vec!["Entirely new objective", "Second objective"]);
    }

    #[test]
    fn test_resolve_merges_optional_extension_fields() {
        let prop = proposal(vec![
            (SectionKey::RiskAssessment, json!("Low switching cost")),
            (SectionKey::CompetitiveAdvantage, json!("First mover locally")),
        ]);
        let merged = resolve(&original(), &prop, true);

        assert_eq!(merged.risk_assessment.as_deref(), Some("Low switching cost"));
        assert_eq!(merged.competitive_advantage.as_deref(), Some("First mover locally"));
        assert_eq!(merged.objectives, vec!["Reduce errors"]);
    }

    #[test]
    fn test_resolve_skips_malformed_section_without_corrupting() {
        let prop = proposal(vec![
            (SectionKey::Objectives, json!({"not": "a list"})),
            (SectionKey::ProblemStatement, json!("Valid new statement")),
        ]);
        let merged = resolve(&original(), &prop, true);

        // The malformed section is untouched, the valid one lands
        assert_eq!(merged.objectives, vec!["Reduce errors"]);
        assert_eq!(merged.problem_statement.as_deref(), Some("Valid new statement"));
    }

    #[test]
    fn test_is_change_false_for_identical_value() {
        let prop = proposal(vec![(SectionKey::ProblemStatement, json!("Orders are tracked by hand"))]);
        let diffs = diff(&original(), &prop);
        assert!(!diffs[0].is_change());
    }
}
