use std::pin::Pin;
use anyhow::Result;
use futures::Stream;
use serde::{Deserialize, Serialize};

/// Lazy sequence of channel-tagged fragments returned by every client.
///
/// An `Err` item means the stream ended early; fragments yielded before it
/// remain valid.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Logical partition of a provider stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Reasoning,
    Answer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Reasoning {
        content: String,
    },

    Message {
        content: String,
    },

    Done {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },
}

impl StreamEvent {
    /// Build a fragment for the given channel
    pub fn fragment(channel: Channel, content: impl Into<String>) -> Self {
        let content = content.into();
        match channel {
            Channel::Reasoning => Self::Reasoning { content },
            Channel::Answer => Self::Message { content },
        }
    }

    /// Channel of a text fragment; `None` for control events
    pub fn channel(&self) -> Option<Channel> {
        match self {
            Self::Reasoning { .. } => Some(Channel::Reasoning),
            Self::Message { .. } => Some(Channel::Answer),
            Self::Done { .. } => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Reasoning { content } | Self::Message { content } => Some(content),
            Self::Done { .. } => None,
        }
    }
}

/// How an adapter assigns the provider's content to channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMode {
    /// Dedicated reasoning fields are reasoning, `content` is the answer.
    #[default]
    Split,

    /// Everything the provider streams is reasoning.
    Reasoning,

    /// `<think>...</think>` spans inside `content` are reasoning, the rest is the answer.
    ThinkTags,
}
