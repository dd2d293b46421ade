use rat_llm::ChatOptions;
use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};
use crate::handoff::HandoffPolicy;

/// What to do when the reasoning stage produces nothing but an error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Return to the prompt without calling the answering provider
    Abort,
    /// Hand the error string to the answering provider as the transcript
    #[default]
    Continue,
}

/// Per-process relay settings
///
/// `show_reasoning` and `answering_model` change at runtime through commands;
/// everything else is fixed once the relay is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    pub reasoning_model: String,
    pub answering_model: String,
    #[serde(default)]
    pub handoff: HandoffPolicy,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default = "default_show_reasoning")]
    pub show_reasoning: bool,
    #[serde(default)]
    pub reasoning_options: ChatOptions,
    #[serde(default)]
    pub answering_options: ChatOptions,
    /// Template for the reasoning request, `{query}` is replaced by the user text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_prompt: Option<String>,
}

fn default_show_reasoning() -> bool {
    true
}

impl RelayConfig {
    pub fn new(reasoning_model: impl Into<String>, answering_model: impl Into<String>) -> Self {
        Self {
            reasoning_model: reasoning_model.into(),
            answering_model: answering_model.into(),
            handoff: HandoffPolicy::default(),
            failure_policy: FailurePolicy::default(),
            show_reasoning: true,
            reasoning_options: ChatOptions::default(),
            answering_options: ChatOptions::default(),
            reasoning_prompt: None,
        }
    }

    pub fn with_handoff(mut self, handoff: HandoffPolicy) -> Self {
        self.handoff = handoff;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_show_reasoning(mut self, show: bool) -> Self {
        self.show_reasoning = show;
        self
    }

    pub fn with_reasoning_options(mut self, options: ChatOptions) -> Self {
        self.reasoning_options = options;
        self
    }

    pub fn with_answering_options(mut self, options: ChatOptions) -> Self {
        self.answering_options = options;
        self
    }

    pub fn with_reasoning_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.reasoning_prompt = Some(prompt.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.reasoning_model.trim().is_empty() {
            return Err(RelayError::EmptyModel("reasoning"));
        }
        if self.answering_model.trim().is_empty() {
            return Err(RelayError::EmptyModel("answering"));
        }
        if let Some(prompt) = &self.reasoning_prompt {
            if !prompt.contains("{query}") {
                return Err(RelayError::InvalidReasoningPrompt(prompt.clone()));
            }
        }
        Ok(())
    }
}
