use anyhow::Result;
use futures::{Stream, StreamExt};
use reqwest::Response;
use std::fmt::Display;

use super::buffering::CircularLineBuffer;
use crate::streaming::{EventStream, StreamEvent};

/// Strategy pattern for parsing provider-specific SSE payloads
pub trait SseLineParser: Send {
    /// Parse a data line into stream events.
    ///
    /// Malformed payloads should be skipped by the parser; an `Err` means the
    /// provider itself signalled a failure and ends the stream.
    fn parse_data_line(&mut self, data: &str) -> Result<Vec<StreamEvent>>;

    /// Check if this line signals end of stream
    fn is_done_marker(&self, data: &str) -> bool {
        data == "[DONE]"
    }

    /// Flush events held back while waiting for more input
    fn finish(&mut self) -> Vec<StreamEvent> {
        Vec::new()
    }

    /// Stop reason reported by the provider, if any
    fn finish_reason(&self) -> Option<String> {
        None
    }
}

/// Parse the SSE body of an HTTP response
pub fn parse_sse_stream<P: SseLineParser + 'static>(response: Response, parser: P) -> EventStream {
    parse_sse_bytes(response.bytes_stream(), parser)
}

/// Generic SSE parser over any byte-chunk stream
///
/// Events are yielded as soon as their line is complete. A transport error
/// yields one `Err` and terminates the stream.
pub fn parse_sse_bytes<S, B, E, P>(stream: S, mut parser: P) -> EventStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
    P: SseLineParser + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(stream);
        let mut buffer = CircularLineBuffer::with_capacity(4096);
        let mut chunk_count = 0usize;

        'read: while let Some(chunk_result) = byte_chunks.next().await {
            let bytes = match chunk_result {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("SSE stream error after {} chunks: {}", chunk_count, e);
                    for event in parser.finish() {
                        yield Ok(event);
                    }
                    yield Err(anyhow::anyhow!("Stream error: {}", e));
                    return;
                }
            };
            chunk_count += 1;
            buffer.extend(bytes.as_ref());

            while let Some(line_result) = buffer.next_line() {
                let line = match line_result {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!("Skipping SSE line with invalid UTF-8: {}", e);
                        continue;
                    }
                };

                let Some(data) = sse_data(&line) else {
                    continue;
                };

                if parser.is_done_marker(data) {
                    break 'read;
                }

                match parser.parse_data_line(data) {
                    Ok(events) => {
                        for event in events {
                            yield Ok(event);
                        }
                    }
                    Err(e) => {
                        for event in parser.finish() {
                            yield Ok(event);
                        }
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        if let Some(line) = buffer.take_remainder() {
            if let Some(data) = sse_data(&line).filter(|d| !parser.is_done_marker(d)) {
                match parser.parse_data_line(data) {
                    Ok(events) => {
                        for event in events {
                            yield Ok(event);
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        for event in parser.finish() {
            yield Ok(event);
        }
        tracing::debug!("SSE stream closed after {} chunks", chunk_count);
        yield Ok(StreamEvent::Done { finish_reason: parser.finish_reason() });
    })
}

/// Payload of a `data:` line; `event:`, `id:` and comment lines yield nothing
fn sse_data(line: &str) -> Option<&str> {
    if line.is_empty() {
        return None;
    }
    line.strip_prefix("data:").map(str::trim_start)
}
