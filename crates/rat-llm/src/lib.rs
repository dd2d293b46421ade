pub mod types;
pub mod traits;
pub mod streaming;
pub mod buffer_utils;
pub mod openai;
pub mod anthropic;
pub mod config;

pub use traits::{ChatClient, ChatRequest, ChatOptions};

pub use streaming::{Channel, ChannelMode, EventStream, StreamEvent};
pub use openai::OpenAIClient;
pub use anthropic::AnthropicClient;
pub use config::{ClientFactory, ProviderConfig, ProviderType};
pub use types::{Message, Content, ContentPart, Role};
