use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::buffer_utils::{SseLineParser, ThinkTagSplitter};
use crate::streaming::{Channel, ChannelMode, StreamEvent};

/// One `chat.completion.chunk` from an OpenAI-compatible endpoint
///
/// Only `choices` is required; local servers often omit the metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: Delta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// DeepSeek reasoner
    #[serde(default)]
    pub reasoning_content: Option<String>,
    /// OpenRouter and Groq
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl ChatStreamChunk {
    pub fn delta(&self) -> Option<&Delta> {
        self.choices.first().map(|c| &c.delta)
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.finish_reason.as_deref())
    }
}

impl Delta {
    /// Text from whichever dedicated reasoning field the provider uses
    pub fn reasoning_text(&self) -> Option<&str> {
        self.reasoning_content
            .as_deref()
            .or(self.reasoning.as_deref())
            .filter(|s| !s.is_empty())
    }

    pub fn content_text(&self) -> Option<&str> {
        self.content.as_deref().filter(|s| !s.is_empty())
    }
}

/// Classifies chat-completion deltas into channels according to a `ChannelMode`
pub struct ChatChunkParser {
    mode: ChannelMode,
    splitter: ThinkTagSplitter,
    finish_reason: Option<String>,
}

impl ChatChunkParser {
    pub fn new(mode: ChannelMode) -> Self {
        Self {
            mode,
            splitter: ThinkTagSplitter::new(),
            finish_reason: None,
        }
    }

    /// Events for one parsed chunk, reasoning before content
    pub fn classify(&mut self, chunk: &ChatStreamChunk) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(reason) = chunk.finish_reason() {
            self.finish_reason = Some(reason.to_string());
        }

        let Some(delta) = chunk.delta() else {
            return events;
        };

        if let Some(reasoning) = delta.reasoning_text() {
            events.push(StreamEvent::fragment(Channel::Reasoning, reasoning));
        }

        if let Some(content) = delta.content_text() {
            match self.mode {
                ChannelMode::Split => events.push(StreamEvent::fragment(Channel::Answer, content)),
                ChannelMode::Reasoning => {
                    events.push(StreamEvent::fragment(Channel::Reasoning, content))
                }
                ChannelMode::ThinkTags => events.extend(self.splitter.push(content)),
            }
        }

        events
    }
}

/// Any text under the first choice's `delta.content` (string or parts array)
/// or its legacy `text` field
fn loose_content(value: &serde_json::Value) -> Option<String> {
    let content = value
        .pointer("/choices/0/delta/content")
        .or_else(|| value.pointer("/choices/0/text"))?;

    let text = match content {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(parts) => parts
            .iter()
            .filter_map(|part| part.as_str().or_else(|| part.get("text").and_then(|t| t.as_str())))
            .collect(),
        _ => return None,
    };
    Some(text).filter(|t| !t.is_empty())
}

impl SseLineParser for ChatChunkParser {
    fn parse_data_line(&mut self, data: &str) -> Result<Vec<StreamEvent>> {
        let value: serde_json::Value = match serde_json::from_str(data) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to parse chat chunk: {}, data: {}", e, data);
                return Ok(Vec::new());
            }
        };

        // OpenRouter and local servers report failures mid-stream as `{"error": {...}}`
        if let Some(error) = value.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            anyhow::bail!("Provider error: {}", message);
        }

        match ChatStreamChunk::deserialize(&value) {
            Ok(chunk) => Ok(self.classify(&chunk)),
            Err(e) => match loose_content(&value) {
                // Text we cannot classify still belongs to the answer
                Some(text) => Ok(vec![StreamEvent::fragment(Channel::Answer, text)]),
                None => {
                    tracing::warn!("Unexpected chat chunk shape: {}, data: {}", e, data);
                    Ok(Vec::new())
                }
            },
        }
    }

    fn finish(&mut self) -> Vec<StreamEvent> {
        self.splitter.finish()
    }

    fn finish_reason(&self) -> Option<String> {
        self.finish_reason.clone()
    }
}
