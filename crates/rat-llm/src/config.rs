// Configuration layer for provider-agnostic client creation

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::streaming::ChannelMode;
use crate::traits::ChatClient;

/// Type of LLM provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Anything speaking the OpenAI chat-completions protocol
    OpenAI,
    Anthropic,
}

/// Configuration for an OpenAI-compatible provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Optional for local servers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Defaults to https://api.openai.com/v1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub channel_mode: ChannelMode,
    /// Display name ("deepseek", "groq", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Configuration for the Anthropic provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Provider-specific configuration details
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderDetails {
    OpenAI(OpenAIConfig),
    Anthropic(AnthropicConfig),
}

/// Complete provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(flatten)]
    pub details: ProviderDetails,
}

impl ProviderConfig {
    /// api.openai.com with a key
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            details: ProviderDetails::OpenAI(OpenAIConfig {
                api_key: Some(api_key.into()),
                base_url: None,
                channel_mode: ChannelMode::default(),
                name: None,
            }),
        }
    }

    /// Any OpenAI-compatible endpoint
    pub fn openai_compatible(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            details: ProviderDetails::OpenAI(OpenAIConfig {
                api_key,
                base_url: Some(base_url.into()),
                channel_mode: ChannelMode::default(),
                name: Some(name.into()),
            }),
        }
    }

    pub fn anthropic(api_key: impl Into<String>) -> Self {
        Self {
            details: ProviderDetails::Anthropic(AnthropicConfig {
                api_key: api_key.into(),
                base_url: None,
            }),
        }
    }

    /// Only meaningful for OpenAI-compatible providers
    pub fn with_channel_mode(mut self, mode: ChannelMode) -> Self {
        if let ProviderDetails::OpenAI(ref mut config) = self.details {
            config.channel_mode = mode;
        }
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = Some(base_url.into());
        match self.details {
            ProviderDetails::OpenAI(ref mut config) => config.base_url = base_url,
            ProviderDetails::Anthropic(ref mut config) => config.base_url = base_url,
        }
        self
    }

    pub fn provider_type(&self) -> ProviderType {
        match self.details {
            ProviderDetails::OpenAI(_) => ProviderType::OpenAI,
            ProviderDetails::Anthropic(_) => ProviderType::Anthropic,
        }
    }
}

/// Factory for creating clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_chat_client(config: ProviderConfig) -> Result<Arc<dyn ChatClient>> {
        match config.details {
            ProviderDetails::OpenAI(openai_config) => {
                let mut builder = crate::openai::OpenAIClient::builder()
                    .channel_mode(openai_config.channel_mode);
                if let Some(api_key) = openai_config.api_key {
                    builder = builder.api_key(api_key);
                }
                if let Some(base_url) = openai_config.base_url {
                    builder = builder.base_url(base_url);
                }
                if let Some(name) = openai_config.name {
                    builder = builder.name(name);
                }
                Ok(Arc::new(builder.build()?))
            }
            ProviderDetails::Anthropic(anthropic_config) => {
                let mut builder = crate::anthropic::AnthropicClient::builder()
                    .api_key(anthropic_config.api_key);
                if let Some(base_url) = anthropic_config.base_url {
                    builder = builder.base_url(base_url);
                }
                Ok(Arc::new(builder.build()?))
            }
        }
    }
}
