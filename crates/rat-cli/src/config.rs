use config::builder::DefaultState;
use config::{Config as ConfigLoader, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use rat_llm::{ChannelMode, ChatOptions, ProviderConfig, ProviderType};
use rat_relay::{FailurePolicy, HandoffPolicy, RelayConfig};
use serde::Deserialize;
use std::path::Path;

use crate::cli::Args;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relay: RelaySection,
    pub reasoning: EndpointConfig,
    pub answering: EndpointConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelaySection {
    #[serde(default)]
    pub handoff: HandoffPolicy,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default = "default_true")]
    pub show_reasoning: bool,
    /// Template for the outgoing reasoning query; must contain `{query}`
    #[serde(default)]
    pub reasoning_prompt: Option<String>,
    /// Probe the answering endpoint before the first prompt
    #[serde(default)]
    pub health_check: bool,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            handoff: HandoffPolicy::default(),
            failure_policy: FailurePolicy::default(),
            show_reasoning: true,
            reasoning_prompt: None,
            health_check: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One provider endpoint and the model used on it
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub provider: ProviderType,
    /// Display name, also used in error messages ("deepseek", "groq", ...)
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the key; unset or empty for local servers
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub channel_mode: ChannelMode,
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,

    // Secret (from ENV only)
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// pretty | json | compact
    pub format: String,
}

impl EndpointConfig {
    pub fn options(&self) -> ChatOptions {
        ChatOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub fn display_name(&self) -> &str {
        match (&self.name, self.provider) {
            (Some(name), _) => name,
            (None, ProviderType::OpenAI) => "openai",
            (None, ProviderType::Anthropic) => "anthropic",
        }
    }

    pub fn key_var(&self) -> Option<&str> {
        self.api_key_env.as_deref().filter(|var| !var.is_empty())
    }

    /// Read the key named by `api_key_env`
    pub fn load_api_key(&mut self) -> Result<(), ConfigError> {
        let Some(var) = self.key_var() else {
            if self.provider == ProviderType::Anthropic {
                return Err(ConfigError::Message(format!(
                    "{}: api_key_env is required for the anthropic provider",
                    self.display_name()
                )));
            }
            return Ok(());
        };

        let key = std::env::var(var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::Message(format!("{var} environment variable is required")))?;
        self.api_key = Some(key);
        Ok(())
    }

    pub fn provider_config(&self) -> Result<ProviderConfig, ConfigError> {
        let config = match self.provider {
            ProviderType::OpenAI => {
                let base_url = self
                    .base_url
                    .clone()
                    .unwrap_or_else(|| rat_llm::openai::OPENAI_API_BASE.to_string());
                ProviderConfig::openai_compatible(self.display_name(), base_url, self.api_key.clone())
                    .with_channel_mode(self.channel_mode)
            }
            ProviderType::Anthropic => {
                let api_key = self.api_key.clone().ok_or_else(|| {
                    ConfigError::Message(format!("{}: API key not loaded", self.display_name()))
                })?;
                let config = ProviderConfig::anthropic(api_key);
                match &self.base_url {
                    Some(base_url) => config.with_base_url(base_url.clone()),
                    None => config,
                }
            }
        };
        Ok(config)
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. built-in defaults
    /// 2. {config_dir}/default.toml
    /// 3. {config_dir}/{profile}.toml (from --profile or RAT_PROFILE)
    /// 4. Environment variables (RAT_ANSWERING__MODEL=...)
    /// 5. Command line flags
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let dir = args.config_dir.as_path();
        let mut builder = Self::defaults()?.add_source(File::with_name(&file_stem(dir, "default")).required(false));

        if let Some(profile) = args.profile.as_deref().filter(|p| *p != "default") {
            builder = builder.add_source(File::with_name(&file_stem(dir, profile)));
        }

        builder = builder.add_source(
            Environment::with_prefix("RAT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut cfg = Self::finish(Self::apply_args(builder, args)?)?;

        // Load secrets from ENV (not in TOML)
        cfg.reasoning.load_api_key()?;
        cfg.answering.load_api_key()?;

        Ok(cfg)
    }

    /// Layer TOML documents over the built-in defaults, without touching the
    /// environment (useful for testing)
    pub fn from_toml_layers(layers: &[&str]) -> Result<Self, ConfigError> {
        let builder = layers.iter().fold(Self::defaults()?, |builder, layer| {
            builder.add_source(File::from_str(layer, FileFormat::Toml))
        });
        Self::finish(builder)
    }

    pub fn relay_config(&self) -> RelayConfig {
        let mut relay = RelayConfig::new(&self.reasoning.model, &self.answering.model)
            .with_handoff(self.relay.handoff)
            .with_failure_policy(self.relay.failure_policy)
            .with_show_reasoning(self.relay.show_reasoning)
            .with_reasoning_options(self.reasoning.options())
            .with_answering_options(self.answering.options());
        if let Some(prompt) = &self.relay.reasoning_prompt {
            relay = relay.with_reasoning_prompt(prompt.clone());
        }
        relay
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        ConfigLoader::builder()
            .set_default("logging.level", "warn")?
            .set_default("logging.format", "compact")
    }

    fn apply_args(
        mut builder: ConfigBuilder<DefaultState>,
        args: &Args,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if args.hide_reasoning {
            builder = builder.set_override("relay.show_reasoning", false)?;
        }
        builder.set_override_option("answering.model", args.model.clone())
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}

fn file_stem(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().into_owned()
}
