// OpenAI-compatible client (OpenAI, DeepSeek, OpenRouter, Groq, local servers)

use crate::buffer_utils::parse_sse_stream;
use crate::openai::ChatChunkParser;
use crate::streaming::{ChannelMode, EventStream};
use crate::traits::{ChatClient, ChatOptions, ChatRequest};
use crate::types::{Content, ContentPart, Message};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Client for any endpoint speaking the `/chat/completions` streaming protocol
#[derive(Debug)]
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
    channel_mode: ChannelMode,
    name: String,
}

impl OpenAIClient {
    /// Create a client for api.openai.com
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    pub fn builder() -> OpenAIClientBuilder {
        OpenAIClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn channel_mode(&self) -> ChannelMode {
        self.channel_mode
    }

    /// Build chat completion request payload
    fn build_chat_request(&self, model: &str, messages: &[Message], options: &ChatOptions) -> Value {
        let openai_messages: Vec<Value> = messages.iter().map(convert_message).collect();

        let mut request = json!({
            "model": model,
            "messages": openai_messages,
            "stream": true,
        });

        if let Some(obj) = request.as_object_mut() {
            if let Some(temp) = options.temperature {
                obj.insert("temperature".to_string(), json!(temp));
            }
            if let Some(max_tokens) = options.max_tokens {
                obj.insert("max_tokens".to_string(), json!(max_tokens));
            }
        }

        request
    }
}

/// Convert our Message type to OpenAI format
fn convert_message(message: &Message) -> Value {
    json!({
        "role": message.role().as_str(),
        "content": convert_content(message.content()),
    })
}

/// Convert Content to OpenAI format (string or array)
fn convert_content(content: &Content) -> Value {
    match content {
        Content::Text(s) => json!(s),
        Content::Parts(parts) => {
            let converted: Vec<Value> = parts
                .iter()
                .map(|ContentPart::Text { text }| json!({ "type": "text", "text": text }))
                .collect();
            json!(converted)
        }
    }
}

/// Builder for OpenAIClient
#[derive(Default)]
pub struct OpenAIClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    channel_mode: ChannelMode,
    name: Option<String>,
}

impl OpenAIClientBuilder {
    /// Local servers accept requests without a key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Example: "https://api.deepseek.com" or "http://localhost:10000/v1"
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn channel_mode(mut self, mode: ChannelMode) -> Self {
        self.channel_mode = mode;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn build(self) -> Result<OpenAIClient> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| OPENAI_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = self.api_key.filter(|k| !k.is_empty()) {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", api_key))
                    .context("Invalid API key format")?,
            );
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(OpenAIClient {
            http_client,
            base_url,
            channel_mode: self.channel_mode,
            name: self.name.unwrap_or_else(|| "openai".to_string()),
        })
    }
}

#[async_trait]
impl ChatClient for OpenAIClient {
    fn provider(&self) -> &str {
        &self.name
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let payload = self.build_chat_request(&request.model, &request.messages, &request.options);
        tracing::debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            "opening chat stream"
        );

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.name))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("{} API error ({}): {}", self.name, status, error_text);
        }

        Ok(parse_sse_stream(response, ChatChunkParser::new(self.channel_mode)))
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .http_client
            .get(format!("{}/models", self.base_url))
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.name))?;

        if !response.status().is_success() {
            anyhow::bail!("{} health check failed ({})", self.name, response.status());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let client = OpenAIClient::builder().build().unwrap();
        assert_eq!(client.base_url(), OPENAI_API_BASE);
        assert_eq!(client.channel_mode(), ChannelMode::Split);
        assert_eq!(client.provider(), "openai");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = OpenAIClient::builder()
            .base_url("http://localhost:10000/v1/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:10000/v1");
    }

    #[test]
    fn test_request_payload() {
        let client = OpenAIClient::new("key").unwrap();
        let messages = vec![
            Message::system("be brief"),
            Message::human("hi"),
            Message::ai(Content::block("<thinking>x</thinking>")),
        ];
        let options = ChatOptions::new().temperature(0.7).max_tokens(2000);
        let payload = client.build_chat_request("m", &messages, &options);

        assert_eq!(payload["model"], "m");
        assert_eq!(payload["stream"], true);
        assert_eq!(payload["max_tokens"], 2000);
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "hi");
        assert_eq!(payload["messages"][2]["content"][0]["text"], "<thinking>x</thinking>");
    }

    #[test]
    fn test_unset_options_omitted() {
        let client = OpenAIClient::new("key").unwrap();
        let payload = client.build_chat_request("m", &[Message::human("hi")], &ChatOptions::default());
        assert!(payload.get("temperature").is_none());
        assert!(payload.get("max_tokens").is_none());
    }
}
