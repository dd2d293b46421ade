mod client;
mod stream;

pub use client::{OpenAIClient, OpenAIClientBuilder, OPENAI_API_BASE};
pub use stream::{ChatChunkParser, ChatStreamChunk, Delta, StreamChoice};
