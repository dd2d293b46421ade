mod client;
mod stream;

pub use client::{AnthropicClient, AnthropicClientBuilder, ANTHROPIC_API_BASE, ANTHROPIC_VERSION};
pub use stream::{BlockDelta, ContentBlock, Event, MessagesEventParser};
