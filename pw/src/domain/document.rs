//! Business-case document model
//!
//! The structured plan produced by intake and reshaped by refinement.
//! Sections that were never populated are omitted entirely on
//! serialization - renderers must not see placeholder values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One pillar of the proposed solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionPillar {
    /// Name of the workstream (e.g. "Process automation")
    pub pillar: String,
    /// Rough effort estimate (e.g. "Low", "6 weeks")
    pub effort: String,
    /// Expected impact (e.g. "High")
    pub impact: String,
    /// Concrete actions within this pillar, in priority order
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment: Option<String>,
}

/// The structured business-case document
///
/// All sections are optional; an empty section is absent, not a
/// placeholder. Array order is authored order and is preserved verbatim
/// through merge and restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessCaseDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_statement: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub objectives: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_state: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub proposed_solution: Vec<SolutionPillar>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expected_outcomes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub next_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_assessment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitive_advantage: Option<String>,
}

/// Top-level section of a [`BusinessCaseDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    ProblemStatement,
    Objectives,
    CurrentState,
    ProposedSolution,
    ExpectedOutcomes,
    NextSteps,
    RiskAssessment,
    CompetitiveAdvantage,
}

impl SectionKey {
    /// All sections in document order
    pub const ALL: [SectionKey; 8] = [
        SectionKey::ProblemStatement,
        SectionKey::Objectives,
        SectionKey::CurrentState,
        SectionKey::ProposedSolution,
        SectionKey::ExpectedOutcomes,
        SectionKey::NextSteps,
        SectionKey::RiskAssessment,
        SectionKey::CompetitiveAdvantage,
    ];

    /// The snake_case field name used in JSON payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProblemStatement => "problem_statement",
            Self::Objectives => "objectives",
            Self::CurrentState => "current_state",
            Self::ProposedSolution => "proposed_solution",
            Self::ExpectedOutcomes => "expected_outcomes",
            Self::NextSteps => "next_steps",
            Self::RiskAssessment => "risk_assessment",
            Self::CompetitiveAdvantage => "competitive_advantage",
        }
    }

    /// Parse a JSON field name into a section key
    ///
    /// Returns None for anything that is not a known top-level section,
    /// which is how hallucinated field names get dropped.
    pub fn parse(s: &str) -> Option<SectionKey> {
        Self::ALL.iter().copied().find(|k| k.as_str() == s)
    }

    /// Human-readable heading for rendering
    pub fn heading(&self) -> &'static str {
        match self {
            Self::ProblemStatement => "Problem Statement",
            Self::Objectives => "Objectives",
            Self::CurrentState => "Current State",
            Self::ProposedSolution => "Proposed Solution",
            Self::ExpectedOutcomes => "Expected Outcomes",
            Self::NextSteps => "Next Steps",
            Self::RiskAssessment => "Risk Assessment",
            Self::CompetitiveAdvantage => "Competitive Advantage",
        }
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl BusinessCaseDocument {
    /// Get a section as a JSON value, or None if absent/empty
    pub fn section(&self, key: SectionKey) -> Option<Value> {
        fn text(s: &Option<String>) -> Option<Value> {
            s.as_ref().map(|v| Value::String(v.clone()))
        }
        fn list<T: Serialize>(v: &[T]) -> Option<Value> {
            if v.is_empty() {
                None
            } else {
                serde_json::to_value(v).ok()
            }
        }

        match key {
            SectionKey::ProblemStatement => text(&self.problem_statement),
            SectionKey::Objectives => list(&self.objectives),
            SectionKey::CurrentState => text(&self.current_state),
            SectionKey::ProposedSolution => list(&self.proposed_solution),
            SectionKey::ExpectedOutcomes => list(&self.expected_outcomes),
            SectionKey::NextSteps => list(&self.next_steps),
            SectionKey::RiskAssessment => text(&self.risk_assessment),
            SectionKey::CompetitiveAdvantage => text(&self.competitive_advantage),
        }
    }

    /// Replace a section with a JSON value
    ///
    /// Fails if the value does not fit the section's shape (e.g. an object
    /// where a string array belongs).
    pub fn set_section(&mut self, key: SectionKey, value: &Value) -> Result<(), serde_json::Error> {
        match key {
            SectionKey::ProblemStatement => self.problem_statement = from_value(value)?,
            SectionKey::Objectives => self.objectives = from_value::<Vec<String>>(value)?.unwrap_or_default(),
            SectionKey::CurrentState => self.current_state = from_value(value)?,
            SectionKey::ProposedSolution => {
                self.proposed_solution = from_value::<Vec<SolutionPillar>>(value)?.unwrap_or_default();
            }
            SectionKey::ExpectedOutcomes => {
                self.expected_outcomes = from_value::<Vec<String>>(value)?.unwrap_or_default();
            }
            SectionKey::NextSteps => self.next_steps = from_value::<Vec<String>>(value)?.unwrap_or_default(),
            SectionKey::RiskAssessment => self.risk_assessment = from_value(value)?,
            SectionKey::CompetitiveAdvantage => self.competitive_advantage = from_value(value)?,
        }
        Ok(())
    }

    /// Check if every section is absent
    pub fn is_empty(&self) -> bool {
        SectionKey::ALL.iter().all(|k| self.section(*k).is_none())
    }

    /// Sections that are currently populated, in document order
    pub fn populated_sections(&self) -> Vec<SectionKey> {
        SectionKey::ALL
            .iter()
            .copied()
            .filter(|k| self.section(*k).is_some())
            .collect()
    }

    /// Render the document as markdown, omitting absent sections
    pub fn render_markdown(&self, title: &str) -> String {
        let mut md = format!("# {}\n\n", title);

        for key in SectionKey::ALL {
            let Some(value) = self.section(key) else { continue };
            md.push_str(&format!("## {}\n\n", key.heading()));

            match key {
                SectionKey::ProposedSolution => {
                    for pillar in &self.proposed_solution {
                        md.push_str(&format!(
                            "### {} (effort: {}, impact: {})\n\n",
                            pillar.pillar, pillar.effort, pillar.impact
                        ));
                        for action in &pillar.actions {
                            md.push_str(&format!("- {}\n", action));
                        }
                        if let Some(timeline) = &pillar.timeline {
                            md.push_str(&format!("\nTimeline: {}\n", timeline));
                        }
                        if let Some(investment) = &pillar.investment {
                            md.push_str(&format!("\nInvestment: {}\n", investment));
                        }
                        md.push('\n');
                    }
                }
                _ => match &value {
                    Value::String(text) => {
                        md.push_str(text);
                        md.push_str("\n\n");
                    }
                    Value::Array(items) => {
                        for item in items {
                            if let Value::String(s) = item {
                                md.push_str(&format!("- {}\n", s));
                            }
                        }
                        md.push('\n');
                    }
                    _ => {}
                },
            }
        }

        md
    }
}

/// Null-tolerant deserialization: JSON null clears the section
fn from_value<T: serde::de::DeserializeOwned>(value: &Value) -> Result<Option<T>, serde_json::Error> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value.clone()).map(Some)
}
