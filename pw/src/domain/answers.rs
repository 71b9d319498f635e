//! Intake answers payload
//!
//! The finished output of the intake flow, handed to plan generation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Fixed set of intake topics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicId {
    BusinessIdea,
    CurrentChallenges,
    ImmediateGoals,
    ServiceInterest,
    CurrentTools,
}

impl TopicId {
    /// All topics in intake order
    pub const ALL: [TopicId; 5] = [
        TopicId::BusinessIdea,
        TopicId::CurrentChallenges,
        TopicId::ImmediateGoals,
        TopicId::ServiceInterest,
        TopicId::CurrentTools,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BusinessIdea => "business_idea",
            Self::CurrentChallenges => "current_challenges",
            Self::ImmediateGoals => "immediate_goals",
            Self::ServiceInterest => "service_interest",
            Self::CurrentTools => "current_tools",
        }
    }
}

impl std::fmt::Display for TopicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A finalized answer for one topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// Free text, accumulated across the primary answer and follow-ups
    Text(String),
    /// Selected option tokens for a selection-type topic
    Selection(Vec<String>),
}

impl Answer {
    /// Flatten the answer into prompt-ready text
    pub fn as_prompt_text(&self) -> String {
        match self {
            Answer::Text(text) => text.clone(),
            Answer::Selection(options) => options.join(", "),
        }
    }
}

/// The finished intake payload: one answer per topic
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormAnswers {
    answers: BTreeMap<TopicId, Answer>,
}

impl FormAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the finalized answer for a topic
    pub fn insert(&mut self, topic: TopicId, answer: Answer) {
        self.answers.insert(topic, answer);
    }

    pub fn get(&self, topic: TopicId) -> Option<&Answer> {
        self.answers.get(&topic)
    }

    pub fn contains(&self, topic: TopicId) -> bool {
        self.answers.contains_key(&topic)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Iterate answers in topic order
    pub fn iter(&self) -> impl Iterator<Item = (TopicId, &Answer)> {
        self.answers.iter().map(|(k, v)| (*k, v))
    }
}
