//! SSE events of the Anthropic streaming Messages API.
//!
//! Text arrives as `content_block_delta` events; extended thinking arrives as
//! `thinking_delta` inside the same event type. `message_delta` carries the
//! stop reason and an `error` event aborts the stream.

use anyhow::Result;
use serde::Deserialize;

use crate::buffer_utils::SseLineParser;
use crate::streaming::{Channel, StreamEvent};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    MessageStart {},
    ContentBlockStart { content_block: ContentBlock },
    ContentBlockDelta { delta: BlockDelta },
    ContentBlockStop {},
    MessageDelta { delta: MessageDeltaBody },
    MessageStop,
    Ping,
    Error { error: ErrorBody },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockDelta {
    TextDelta { text: String },
    ThinkingDelta { thinking: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct MessageDeltaBody {
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

/// Maps Messages API events onto channel-tagged fragments
#[derive(Debug, Default)]
pub struct MessagesEventParser {
    stop_reason: Option<String>,
}

impl MessagesEventParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SseLineParser for MessagesEventParser {
    fn parse_data_line(&mut self, data: &str) -> Result<Vec<StreamEvent>> {
        let event = match serde_json::from_str::<Event>(data) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Failed to parse Anthropic event: {}, data: {}", e, data);
                return Ok(Vec::new());
            }
        };

        let fragment = match event {
            Event::ContentBlockStart { content_block: ContentBlock::Text { text } } => {
                Some(StreamEvent::fragment(Channel::Answer, text))
            }
            Event::ContentBlockStart { content_block: ContentBlock::Thinking { thinking } } => {
                Some(StreamEvent::fragment(Channel::Reasoning, thinking))
            }
            Event::ContentBlockDelta { delta: BlockDelta::TextDelta { text } } => {
                Some(StreamEvent::fragment(Channel::Answer, text))
            }
            Event::ContentBlockDelta { delta: BlockDelta::ThinkingDelta { thinking } } => {
                Some(StreamEvent::fragment(Channel::Reasoning, thinking))
            }
            Event::MessageDelta { delta } => {
                self.stop_reason = delta.stop_reason;
                None
            }
            Event::Error { error } => {
                anyhow::bail!("Anthropic stream error ({}): {}", error.kind, error.message);
            }
            _ => None,
        };

        Ok(fragment
            .filter(|event| event.text().is_some_and(|t| !t.is_empty()))
            .into_iter()
            .collect())
    }

    fn finish_reason(&self) -> Option<String> {
        self.stop_reason.clone()
    }
}
