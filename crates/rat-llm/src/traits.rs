use crate::streaming::EventStream;
use crate::types::Message;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Streaming chat-completion contract shared by every provider adapter
///
/// `chat_stream` fails outright when the request cannot be opened
/// (unreachable host, auth failure, non-2xx status). Once it returns, failures
/// surface as a terminal `Err` item on the stream.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Human-readable provider name used in logs and status lines
    fn provider(&self) -> &str;

    /// Open a streaming chat completion
    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream>;

    /// Probe whether the endpoint is reachable and accepts our credentials
    async fn health_check(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

/// Generation parameters forwarded to the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}
