//! Intake topic definitions
//!
//! Static descriptors for the question flow. Defined once at process start
//! and never mutated.

use crate::domain::TopicId;

/// How a topic collects its answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicKind {
    /// Free-text answer, depth-checked against `min_chars`
    FreeText,
    /// Pick one or more of a fixed option set; depth check is bypassed
    MultiSelect { options: &'static [&'static str] },
}

/// Static descriptor for one intake topic
#[derive(Debug, Clone)]
pub struct Topic {
    pub id: TopicId,
    /// The question shown when the topic becomes active
    pub prompt: &'static str,
    /// Minimum accumulated characters; 0 disables the depth check
    pub min_chars: usize,
    /// Clarifying prompts asked, in order, while the answer is too thin
    pub follow_ups: &'static [&'static str],
    pub kind: TopicKind,
}

impl Topic {
    /// Shorthand for a free-text topic
    pub fn free_text(
        id: TopicId,
        prompt: &'static str,
        min_chars: usize,
        follow_ups: &'static [&'static str],
    ) -> Self {
        Self {
            id,
            prompt,
            min_chars,
            follow_ups,
            kind: TopicKind::FreeText,
        }
    }

    /// Shorthand for a multi-select topic (no depth requirement)
    pub fn multi_select(id: TopicId, prompt: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            id,
            prompt,
            min_chars: 0,
            follow_ups: &[],
            kind: TopicKind::MultiSelect { options },
        }
    }
}

/// Service options offered on the service-interest topic
pub const SERVICE_OPTIONS: &[&str] = &[
    "Strategy & planning",
    "Process automation",
    "Custom software",
    "Data & analytics",
    "AI enablement",
    "Marketing & growth",
];

/// The production intake flow, in question order
pub fn default_topics() -> Vec<Topic> {
    vec![
        Topic::free_text(
            TopicId::BusinessIdea,
            "Tell me about your business idea. What do you want to build or improve?",
            60,
            &[
                "What makes this idea different from what's already out there?",
                "Who is the customer, and what would they pay for?",
            ],
        ),
        Topic::free_text(
            TopicId::CurrentChallenges,
            "What are the biggest challenges you're facing right now?",
            40,
            &[
                "Which of those challenges costs you the most time or money?",
                "What have you already tried to fix it?",
            ],
        ),
        Topic::free_text(
            TopicId::ImmediateGoals,
            "What would you like to achieve in the next 3-6 months?",
            40,
            &["If you could only hit one milestone this quarter, what would it be?"],
        ),
        Topic::multi_select(
            TopicId::ServiceInterest,
            "Which areas are you most interested in getting help with?",
            SERVICE_OPTIONS,
        ),
        Topic::free_text(
            TopicId::CurrentTools,
            "What tools or systems do you currently use to run the business?",
            0,
            &[],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_topics_cover_all_ids_in_order() {
        let topics = default_topics();
        let ids: Vec<TopicId> = topics.iter().map(|t| t.id).collect();
        assert_eq!(ids, TopicId::ALL.to_vec());
    }

    #[test]
    fn test_multi_select_has_no_depth_requirement() {
        let topics = default_topics();
        let service = topics.iter().find(|t| t.id == TopicId::ServiceInterest).unwrap();
        assert_eq!(service.min_chars, 0);
        assert!(service.follow_ups.is_empty());
        assert!(matches!(service.kind, TopicKind::MultiSelect { options } if !options.is_empty()));
    }

    #[test]
    fn test_free_text_topics_have_bounded_follow_ups() {
        for topic in default_topics() {
            assert!(topic.follow_ups.len() <= 2, "topic {} has too many follow-ups", topic.id);
        }
    }
}
