// Anthropic Messages API client

use crate::anthropic::MessagesEventParser;
use crate::buffer_utils::parse_sse_stream;
use crate::streaming::EventStream;
use crate::traits::{ChatClient, ChatOptions, ChatRequest};
use crate::types::{ContentPart, Message};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 8000;

/// Anthropic client (HTTP direct, no SDK)
///
/// The Messages API differs from chat completions in three ways that matter here:
/// - auth goes in `x-api-key` plus a pinned `anthropic-version` header
/// - system prompts are a top-level field, not a message
/// - `max_tokens` is mandatory
///
/// A trailing assistant message is continued rather than answered, which is
/// what the prefill handoff relies on.
#[derive(Debug)]
pub struct AnthropicClient {
    http_client: reqwest::Client,
    base_url: String,
    default_max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    pub fn builder() -> AnthropicClientBuilder {
        AnthropicClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_messages_request(&self, model: &str, messages: &[Message], options: &ChatOptions) -> Value {
        let system: Vec<String> = messages
            .iter()
            .filter(|m| matches!(m, Message::System { .. }))
            .map(|m| m.content().to_text())
            .collect();

        let turns: Vec<Value> = messages
            .iter()
            .filter(|m| !matches!(m, Message::System { .. }))
            .map(|m| {
                let blocks: Vec<Value> = m
                    .content()
                    .clone()
                    .into_parts()
                    .into_iter()
                    .map(|ContentPart::Text { text }| json!({ "type": "text", "text": text }))
                    .collect();
                json!({ "role": m.role().as_str(), "content": blocks })
            })
            .collect();

        let mut request = json!({
            "model": model,
            "messages": turns,
            "max_tokens": options.max_tokens.unwrap_or(self.default_max_tokens),
            "stream": true,
        });

        if let Some(obj) = request.as_object_mut() {
            if !system.is_empty() {
                obj.insert("system".to_string(), json!(system.join("\n\n")));
            }
            if let Some(temp) = options.temperature {
                obj.insert("temperature".to_string(), json!(temp));
            }
        }

        request
    }
}

/// Builder for AnthropicClient
#[derive(Default)]
pub struct AnthropicClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    default_max_tokens: Option<u32>,
}

impl AnthropicClientBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Used when a request does not set `max_tokens`
    pub fn default_max_tokens(mut self, tokens: u32) -> Self {
        self.default_max_tokens = Some(tokens);
        self
    }

    pub fn build(self) -> Result<AnthropicClient> {
        let api_key = self
            .api_key
            .filter(|k| !k.is_empty())
            .context("API key is required")?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| ANTHROPIC_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&api_key).context("Invalid API key format")?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(AnthropicClient {
            http_client,
            base_url,
            default_max_tokens: self.default_max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        })
    }
}

#[async_trait]
impl ChatClient for AnthropicClient {
    fn provider(&self) -> &str {
        "anthropic"
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let payload = self.build_messages_request(&request.model, &request.messages, &request.options);
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "opening anthropic message stream"
        );

        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.base_url))
            .json(&payload)
            .send()
            .await
            .context("Failed to reach anthropic")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error ({}): {}", status, error_text);
        }

        Ok(parse_sse_stream(response, MessagesEventParser::new()))
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .http_client
            .get(format!("{}/v1/models", self.base_url))
            .send()
            .await
            .context("Failed to reach anthropic")?;

        if !response.status().is_success() {
            anyhow::bail!("anthropic health check failed ({})", response.status());
        }
        Ok(())
    }
}
