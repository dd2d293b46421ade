use rat_llm::{Channel, ChatClient, ChatOptions, ChatRequest};
use std::sync::Arc;

use super::{drain, StageOutcome};
use crate::handoff::HandoffPayload;
use crate::sink::{OutputSink, Status};
use crate::state::ConversationState;

/// Answer text returned when the answering stream produced nothing
pub const ANSWER_ERROR: &str = "Error occurred while streaming response";

#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub answer: String,
    pub outcome: StageOutcome,
}

/// Drives the answering provider for one turn
pub struct AnsweringStage {
    client: Arc<dyn ChatClient>,
    options: ChatOptions,
}

impl AnsweringStage {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self {
            client,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn client(&self) -> &Arc<dyn ChatClient> {
        &self.client
    }

    /// Stream the answer for `payload` on top of the committed answering history.
    ///
    /// The payload goes into this request only; the history is left untouched.
    pub async fn run(
        &self,
        state: &ConversationState,
        payload: &HandoffPayload,
        model: &str,
        sink: &mut dyn OutputSink,
    ) -> AnswerResult {
        let mut messages = state.answering_history().to_vec();
        messages.extend_from_slice(payload.messages());
        let request = ChatRequest::new(model, messages).with_options(self.options.clone());

        tracing::info!(
            "ANSWERING_STAGE: provider={}, model={}, messages={}",
            self.client.provider(),
            model,
            request.messages.len()
        );

        sink.write_status(Status::heading(model));

        let (answer, outcome) = match self.client.chat_stream(request).await {
            Ok(stream) => {
                let drained = drain(stream, Channel::Answer, true, sink).await;
                tracing::debug!(
                    "ANSWERING_STAGE: {} fragments, finish_reason={:?}",
                    drained.fragments,
                    drained.finish_reason
                );
                let outcome = drained.outcome();
                (drained.text, outcome)
            }
            Err(e) => (
                String::new(),
                StageOutcome::Failed {
                    reason: format!("{e:#}"),
                },
            ),
        };

        let answer = match &outcome {
            StageOutcome::Complete => answer,
            StageOutcome::Truncated { reason } => {
                tracing::warn!("Answer stream truncated: {}", reason);
                sink.write_status(Status::warning(format!("Answer stream interrupted: {reason}")));
                answer
            }
            StageOutcome::Failed { reason } => {
                tracing::warn!("Answering stage failed: {}", reason);
                sink.write_status(Status::error(format!("Error in streaming response: {reason}")));
                ANSWER_ERROR.to_string()
            }
        };

        AnswerResult { answer, outcome }
    }
}
