use rat_llm::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a turn currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    #[default]
    Idle,
    ReasoningInFlight,
    AnsweringInFlight,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::ReasoningInFlight => write!(f, "reasoning"),
            Self::AnsweringInFlight => write!(f, "answering"),
        }
    }
}

/// The two per-provider histories
///
/// The reasoning side sees every query and every final answer, but never its
/// own transcripts. The answering side sees query/answer pairs only.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    reasoning_history: Vec<Message>,
    answering_history: Vec<Message>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reasoning_history(&self) -> &[Message] {
        &self.reasoning_history
    }

    pub fn answering_history(&self) -> &[Message] {
        &self.answering_history
    }

    /// Record the user query on the reasoning side, ahead of the request
    pub fn record_query(&mut self, query: &str) {
        self.reasoning_history.push(Message::human(query));
    }

    /// Persist a finished exchange. The reasoning transcript is not a
    /// parameter: neither history ever stores it.
    pub fn commit(&mut self, query: &str, answer: &str) {
        self.answering_history.push(Message::human(query));
        self.answering_history.push(Message::ai(answer));
        self.reasoning_history.push(Message::ai(answer));
    }

    pub fn reset(&mut self) {
        self.reasoning_history.clear();
        self.answering_history.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.reasoning_history.is_empty() && self.answering_history.is_empty()
    }
}
