mod buffering;
mod sse_parser;
mod tag_splitter;

pub use buffering::CircularLineBuffer;
pub use sse_parser::{SseLineParser, parse_sse_bytes, parse_sse_stream};
pub use tag_splitter::ThinkTagSplitter;
