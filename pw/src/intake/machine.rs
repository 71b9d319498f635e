//! Intake state machine
//!
//! Drives the question sequence: every submitted answer either finalizes
//! the active topic, or triggers the next unused follow-up prompt. The
//! machine is a plain in-process component with no I/O; a UI or request
//! handler feeds it text and renders the returned step.
//!
//! Transition rules:
//! - free-text answers accumulate per topic; depth is evaluated on the
//!   accumulated text, so a thin first answer plus a follow-up answer can
//!   clear the bar together
//! - when follow-ups run out, the topic finalizes with whatever text exists
//!   rather than looping forever
//! - selection topics bypass depth entirely; an empty selection is a
//!   validation error, not a transition
//! - once Complete, further submissions are rejected (duplicate-submit
//!   protection for retried requests)

use thiserror::Error;
use tracing::debug;

use crate::domain::{Answer, FormAnswers};

use super::depth::is_sufficient;
use super::topics::{Topic, TopicKind};

/// Where the machine currently is in the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeState {
    /// Waiting for the primary answer to a topic
    AwaitingAnswer { topic: usize },
    /// Waiting for the answer to follow-up `follow_up` of a topic
    AwaitingFollowUp { topic: usize, follow_up: usize },
    /// All topics finalized
    Complete,
}

/// One submitted answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerInput {
    Text(String),
    Selection(Vec<String>),
}

impl From<&str> for AnswerInput {
    fn from(text: &str) -> Self {
        AnswerInput::Text(text.to_string())
    }
}

/// What the caller should do next after a submission
#[derive(Debug, Clone, PartialEq)]
pub enum IntakeStep {
    /// The answer was too thin; ask this follow-up for the same topic
    FollowUp { topic: usize, prompt: &'static str },
    /// Topic finalized; ask the next topic's question
    NextTopic { topic: usize, prompt: &'static str },
    /// Intake finished; the payload is ready for plan generation
    Complete { answers: FormAnswers },
}

/// Validation failures surfaced to the caller as structured reasons
///
/// None of these unwind; a UI renders them as a short message and the flow
/// continues (or, for the index errors, a handler bug gets caught loudly).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("Intake is already complete")]
    AlreadyComplete,

    /// Out-of-range or out-of-turn topic index; never clamped
    #[error("Topic index {got} is not the active topic {expected}")]
    TopicIndex { got: usize, expected: usize },

    /// Duplicate submission for a topic that was already finalized
    #[error("Topic {0} was already answered")]
    TopicFinalized(usize),

    #[error("Select at least one option")]
    EmptySelection,

    #[error("This question expects free text")]
    ExpectedText,

    #[error("This question expects a selection")]
    ExpectedSelection,
}

/// Per-topic transient state while the topic is active
#[derive(Debug, Clone, Default)]
struct DepthState {
    /// Primary answer plus all follow-up answers, space-joined
    accumulated: String,
    /// Index of the next unused follow-up
    next_follow_up: usize,
    /// Set once a depth check has failed for this topic
    insufficient: bool,
}

impl DepthState {
    fn append(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.accumulated.is_empty() {
            self.accumulated.push(' ');
        }
        self.accumulated.push_str(text);
    }
}

/// What to do with a free-text topic after an answer lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    /// Depth bar met; finalize and advance
    Finalize,
    /// Too thin, follow-ups remain; ask follow-up at this index
    FollowUp(usize),
    /// Too thin but follow-ups exhausted; finalize with what exists
    FinalizeExhausted,
}

/// Pure decision core, independent of machine state
fn disposition(topic: &Topic, accumulated: &str, next_follow_up: usize) -> Disposition {
    if is_sufficient(accumulated, topic.min_chars) {
        Disposition::Finalize
    } else if next_follow_up < topic.follow_ups.len() {
        Disposition::FollowUp(next_follow_up)
    } else {
        Disposition::FinalizeExhausted
    }
}

/// The intake state machine
pub struct IntakeMachine {
    topics: Vec<Topic>,
    state: IntakeState,
    progress: Vec<DepthState>,
    answers: FormAnswers,
}

impl IntakeMachine {
    /// Create a machine over the given topics, starting at the first
    pub fn new(topics: Vec<Topic>) -> Self {
        let state = if topics.is_empty() {
            IntakeState::Complete
        } else {
            IntakeState::AwaitingAnswer { topic: 0 }
        };
        let progress = vec![DepthState::default(); topics.len()];
        Self {
            topics,
            state,
            progress,
            answers: FormAnswers::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> IntakeState {
        self.state
    }

    /// Answers finalized so far
    pub fn answers(&self) -> &FormAnswers {
        &self.answers
    }

    /// The topics this machine asks
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// The prompt the caller should be showing right now, if any
    pub fn current_prompt(&self) -> Option<&'static str> {
        match self.state {
            IntakeState::AwaitingAnswer { topic } => Some(self.topics[topic].prompt),
            IntakeState::AwaitingFollowUp { topic, follow_up } => Some(self.topics[topic].follow_ups[follow_up]),
            IntakeState::Complete => None,
        }
    }

    /// Submit an answer for a topic
    ///
    /// `topic_index` must be the active topic: a stale index (already
    /// finalized) or an out-of-range index is rejected, never clamped, so
    /// retried requests cannot double-append an answer.
    pub fn submit_answer(&mut self, topic_index: usize, input: AnswerInput) -> Result<IntakeStep, IntakeError> {
        let active = match self.state {
            IntakeState::Complete => return Err(IntakeError::AlreadyComplete),
            IntakeState::AwaitingAnswer { topic } | IntakeState::AwaitingFollowUp { topic, .. } => topic,
        };

        if topic_index >= self.topics.len() || topic_index > active {
            return Err(IntakeError::TopicIndex {
                got: topic_index,
                expected: active,
            });
        }
        if topic_index < active {
            return Err(IntakeError::TopicFinalized(topic_index));
        }

        let topic = &self.topics[active];
        debug!(topic = %topic.id, state = ?self.state, "submit_answer");

        match (&topic.kind, input) {
            (TopicKind::MultiSelect { .. }, AnswerInput::Selection(selected)) => {
                if selected.is_empty() {
                    return Err(IntakeError::EmptySelection);
                }
                self.answers.insert(topic.id, Answer::Selection(selected));
                Ok(self.advance(active))
            }
            (TopicKind::MultiSelect { .. }, AnswerInput::Text(_)) => Err(IntakeError::ExpectedSelection),
            (TopicKind::FreeText, AnswerInput::Selection(_)) => Err(IntakeError::ExpectedText),
            (TopicKind::FreeText, AnswerInput::Text(text)) => {
                self.progress[active].append(&text);
                let depth = &self.progress[active];

                match disposition(topic, &depth.accumulated, depth.next_follow_up) {
                    Disposition::Finalize => {
                        let answer = Answer::Text(depth.accumulated.clone());
                        self.answers.insert(topic.id, answer);
                        Ok(self.advance(active))
                    }
                    Disposition::FinalizeExhausted => {
                        debug!(topic = %topic.id, "follow-ups exhausted, finalizing as-is");
                        let depth = &mut self.progress[active];
                        depth.insufficient = true;
                        let answer = Answer::Text(depth.accumulated.clone());
                        self.answers.insert(topic.id, answer);
                        Ok(self.advance(active))
                    }
                    Disposition::FollowUp(index) => {
                        let depth = &mut self.progress[active];
                        depth.insufficient = true;
                        depth.next_follow_up = index + 1;
                        self.state = IntakeState::AwaitingFollowUp {
                            topic: active,
                            follow_up: index,
                        };
                        Ok(IntakeStep::FollowUp {
                            topic: active,
                            prompt: self.topics[active].follow_ups[index],
                        })
                    }
                }
            }
        }
    }

    /// Move past a finalized topic
    fn advance(&mut self, finalized: usize) -> IntakeStep {
        let next = finalized + 1;
        if next < self.topics.len() {
            self.state = IntakeState::AwaitingAnswer { topic: next };
            IntakeStep::NextTopic {
                topic: next,
                prompt: self.topics[next].prompt,
            }
        } else {
            self.state = IntakeState::Complete;
            debug!(answer_count = self.answers.len(), "intake complete");
            IntakeStep::Complete {
                answers: self.answers.clone(),
            }
        }
    }
}
