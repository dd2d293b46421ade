use rat_llm::ChatClient;
use std::sync::Arc;

use crate::command::Command;
use crate::config::{FailurePolicy, RelayConfig};
use crate::error::Result;
use crate::sink::{OutputSink, Status};
use crate::stages::{AnswerResult, AnsweringStage, ReasoningResult, ReasoningStage};
use crate::state::{ConversationState, TurnState};

/// Hint shown when the answering endpoint does not answer a health probe
pub const UNREACHABLE_HINT: &str = "Check the answering endpoint (is the model server running?)";

/// Whether the REPL should keep reading input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// What happened during one turn
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub reasoning: ReasoningResult,
    /// `None` when the turn stopped after a failed reasoning stage
    pub answer: Option<AnswerResult>,
    pub committed: bool,
}

/// One conversation: two stages, two histories, one turn at a time
pub struct Relay {
    reasoning: ReasoningStage,
    answering: AnsweringStage,
    config: RelayConfig,
    state: ConversationState,
    turn: TurnState,
}

impl Relay {
    pub fn new(
        reasoning_client: Arc<dyn ChatClient>,
        answering_client: Arc<dyn ChatClient>,
        config: RelayConfig,
    ) -> Result<Self> {
        config.validate()?;

        let reasoning = ReasoningStage::new(reasoning_client, config.reasoning_model.clone())
            .with_options(config.reasoning_options.clone())
            .with_prompt(config.reasoning_prompt.clone());
        let answering =
            AnsweringStage::new(answering_client).with_options(config.answering_options.clone());

        tracing::info!(
            "Relay ready: reasoning={}/{}, answering={}/{}, handoff={}",
            reasoning.client().provider(),
            config.reasoning_model,
            answering.client().provider(),
            config.answering_model,
            config.handoff
        );

        Ok(Self {
            reasoning,
            answering,
            config,
            state: ConversationState::new(),
            turn: TurnState::Idle,
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn turn_state(&self) -> TurnState {
        self.turn
    }

    pub fn show_reasoning(&self) -> bool {
        self.config.show_reasoning
    }

    pub fn reasoning_model(&self) -> &str {
        self.reasoning.model()
    }

    pub fn answering_model(&self) -> &str {
        &self.config.answering_model
    }

    /// Apply one parsed input line
    pub async fn handle(&mut self, command: Command, sink: &mut dyn OutputSink) -> Flow {
        match command {
            Command::Quit => return Flow::Quit,
            Command::Empty => {}
            Command::Clear => {
                self.state.reset();
                tracing::info!("Conversation history cleared");
                sink.write_status(Status::notice("Conversation history cleared"));
            }
            Command::ToggleReasoning => {
                self.config.show_reasoning = !self.config.show_reasoning;
                let label = if self.config.show_reasoning { "ON" } else { "OFF" };
                sink.write_status(Status::notice(format!("Reasoning visibility: {label}")));
            }
            Command::SetModel(model) => {
                tracing::info!("Answering model: {} -> {}", self.config.answering_model, model);
                sink.write_status(Status::notice(format!("Switched to model: {model}")));
                self.config.answering_model = model;
            }
            Command::Query(query) => {
                self.run_turn(&query, sink).await;
            }
        }
        Flow::Continue
    }

    /// Reason, hand off, answer, commit.
    ///
    /// Nothing here is fatal. The answer is committed unless the answering
    /// stage failed outright; a failed reasoning stage under
    /// [`FailurePolicy::Abort`] stops before the answering provider is called.
    pub async fn run_turn(&mut self, query: &str, sink: &mut dyn OutputSink) -> TurnReport {
        self.transition(TurnState::ReasoningInFlight);
        let reasoning = self
            .reasoning
            .run(&mut self.state, query, self.config.show_reasoning, sink)
            .await;

        if reasoning.outcome.is_failed() && self.config.failure_policy == FailurePolicy::Abort {
            self.transition(TurnState::Idle);
            return TurnReport {
                reasoning,
                answer: None,
                committed: false,
            };
        }

        self.transition(TurnState::AnsweringInFlight);
        let payload = self.config.handoff.encode(query, &reasoning.transcript);
        let model = self.config.answering_model.clone();
        let answer = self.answering.run(&self.state, &payload, &model, sink).await;

        let committed = !answer.outcome.is_failed();
        if committed {
            self.state.commit(query, &answer.answer);
        } else if !self.answering_reachable().await {
            sink.write_status(Status::warning(UNREACHABLE_HINT));
        }

        self.transition(TurnState::Idle);
        TurnReport {
            reasoning,
            answer: Some(answer),
            committed,
        }
    }

    /// Mark an interrupted turn as finished.
    ///
    /// Called after the future returned by [`Relay::run_turn`] was dropped.
    /// The pre-request user entry stays in the reasoning history.
    pub fn cancel_turn(&mut self) {
        if self.turn != TurnState::Idle {
            tracing::info!("Turn cancelled while {}", self.turn);
            self.transition(TurnState::Idle);
        }
    }

    pub async fn answering_reachable(&self) -> bool {
        match self.answering.client().health_check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Answering endpoint health check failed: {:#}", e);
                false
            }
        }
    }

    fn transition(&mut self, next: TurnState) {
        tracing::debug!("Turn state: {} -> {}", self.turn, next);
        self.turn = next;
    }
}
