use rat_llm::{Channel, ChatClient, ChatOptions, ChatRequest, Message, Role};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{drain, format_elapsed, StageOutcome};
use crate::sink::{OutputSink, Status};
use crate::state::ConversationState;

/// Prefix of the transcript produced when the reasoning model yields nothing
pub const REASONING_ERROR_PREFIX: &str = "Reasoning model error: ";

#[derive(Debug, Clone)]
pub struct ReasoningResult {
    /// Reasoning channel text, or the local error string when the stage failed
    pub transcript: String,
    pub elapsed: Duration,
    pub outcome: StageOutcome,
}

/// Drives the reasoning provider for one turn
pub struct ReasoningStage {
    client: Arc<dyn ChatClient>,
    model: String,
    options: ChatOptions,
    prompt: Option<String>,
}

impl ReasoningStage {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            options: ChatOptions::default(),
            prompt: None,
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Render the outgoing copy of the query through `prompt`.
    /// `{query}` is replaced by the user text.
    pub fn with_prompt(mut self, prompt: Option<String>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn client(&self) -> &Arc<dyn ChatClient> {
        &self.client
    }

    /// Run the stage. Records the query in the reasoning history first and
    /// never fails: provider errors end up in the result's outcome.
    pub async fn run(
        &self,
        state: &mut ConversationState,
        query: &str,
        show_reasoning: bool,
        sink: &mut dyn OutputSink,
    ) -> ReasoningResult {
        state.record_query(query);
        let request = ChatRequest::new(
            self.model.clone(),
            self.request_messages(state.reasoning_history()),
        )
        .with_options(self.options.clone());

        tracing::info!(
            "REASONING_STAGE: provider={}, model={}, history={}",
            self.client.provider(),
            self.model,
            request.messages.len()
        );

        if show_reasoning {
            sink.write_status(Status::heading("Reasoning Process"));
        }

        let started = Instant::now();
        let (transcript, outcome) = match self.client.chat_stream(request).await {
            Ok(stream) => {
                let drained = drain(stream, Channel::Reasoning, show_reasoning, sink).await;
                let outcome = drained.outcome();
                tracing::debug!(
                    "REASONING_STAGE: {} fragments, finish_reason={:?}",
                    drained.fragments,
                    drained.finish_reason
                );
                (drained.text, outcome)
            }
            Err(e) => (
                String::new(),
                StageOutcome::Failed {
                    reason: format!("{e:#}"),
                },
            ),
        };
        let elapsed = started.elapsed();

        let transcript = match &outcome {
            StageOutcome::Complete => transcript,
            StageOutcome::Truncated { reason } => {
                tracing::warn!("Reasoning stream truncated: {}", reason);
                sink.write_status(Status::warning(format!(
                    "Reasoning stream interrupted, continuing with partial reasoning: {reason}"
                )));
                transcript
            }
            StageOutcome::Failed { reason } => {
                tracing::warn!("Reasoning stage failed: {}", reason);
                let message = format!("{REASONING_ERROR_PREFIX}{reason}");
                sink.write_status(Status::error(message.clone()));
                message
            }
        };

        sink.write_status(Status::info(format!("Thought for {}", format_elapsed(elapsed))));

        ReasoningResult {
            transcript,
            elapsed,
            outcome,
        }
    }

    /// Outgoing copy of the history: the prompt applied to the latest query,
    /// then runs of same-role entries joined so roles strictly alternate.
    fn request_messages(&self, history: &[Message]) -> Vec<Message> {
        let mut messages = history.to_vec();
        if let (Some(prompt), Some(last)) = (&self.prompt, messages.last_mut()) {
            if last.role() == Role::User {
                let rendered = prompt.replace("{query}", &last.content().to_text());
                *last = last.with_content(rendered);
            }
        }
        merge_same_role(messages)
    }
}

/// Join consecutive entries of one role with a blank line.
///
/// A turn that failed after its query was recorded leaves two user entries in
/// a row, which strict-turn providers reject.
fn merge_same_role(messages: Vec<Message>) -> Vec<Message> {
    let mut merged: Vec<Message> = Vec::with_capacity(messages.len());
    for message in messages {
        match merged.last_mut() {
            Some(prev) if prev.role() == message.role() => {
                let joined = format!(
                    "{}\n\n{}",
                    prev.content().to_text(),
                    message.content().to_text()
                );
                *prev = prev.with_content(joined);
            }
            _ => merged.push(message),
        }
    }
    merged
}
