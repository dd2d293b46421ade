use rat_llm::{Content, Message};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wraps the transcript in the assistant prefill
pub const THINKING_OPEN: &str = "<thinking>";
pub const THINKING_CLOSE: &str = "</thinking>";

const TEMPLATE_INSTRUCTIONS: &str = "Provide detailed answer in plain text format.";

const SYSTEM_PROMPT_HEAD: &str =
    "You are a helpful assistant. Use this reasoning to craft your response:\n";
const SYSTEM_PROMPT_TAIL: &str =
    "\n\nRespond conversationally without markdown formatting.\nKeep responses concise and focused.";

/// How the reasoning transcript is handed to the answering provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffPolicy {
    /// The transcript becomes the start of the answering model's own turn.
    /// Requires a provider that continues a trailing assistant message.
    Prefill,
    /// Query and transcript are embedded in one labelled user message.
    #[default]
    Template,
    /// The transcript steers the answer from a system message.
    SystemPrompt,
}

impl HandoffPolicy {
    /// Build the messages for one turn. Pure: same inputs, same payload.
    pub fn encode(&self, query: &str, transcript: &str) -> HandoffPayload {
        let messages = match self {
            Self::Prefill => vec![
                Message::human(Content::block(query)),
                Message::ai(Content::block(format!(
                    "{THINKING_OPEN}{transcript}{THINKING_CLOSE}"
                ))),
            ],
            Self::Template => vec![Message::human(format!(
                "**User Query**: {query}\n\n**Analysis**: {transcript}\n\n**Instructions**: {TEMPLATE_INSTRUCTIONS}"
            ))],
            Self::SystemPrompt => vec![
                Message::system(format!("{SYSTEM_PROMPT_HEAD}{transcript}{SYSTEM_PROMPT_TAIL}")),
                Message::human(query),
            ],
        };
        HandoffPayload { messages }
    }
}

impl fmt::Display for HandoffPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefill => write!(f, "prefill"),
            Self::Template => write!(f, "template"),
            Self::SystemPrompt => write!(f, "system_prompt"),
        }
    }
}

/// Messages appended to the answering request for one turn; never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffPayload {
    messages: Vec<Message>,
}

impl HandoffPayload {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
