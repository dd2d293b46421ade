use std::collections::VecDeque;

/// Circular buffer for line-based parsing of a byte stream
///
/// Lines are only decoded once complete, so multi-byte characters split
/// across network chunks survive intact.
pub struct CircularLineBuffer {
    buffer: VecDeque<u8>,
}

impl CircularLineBuffer {
    /// Create a new buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Add bytes to the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract next line (up to \n) from buffer, trimmed
    /// Returns None if no complete line is available
    pub fn next_line(&mut self) -> Option<Result<String, std::str::Utf8Error>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();

        Some(std::str::from_utf8(&line_bytes).map(|line| line.trim().to_string()))
    }

    /// Take whatever is left once the byte stream has ended
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let bytes: Vec<u8> = self.buffer.drain(..).collect();
        let line = String::from_utf8_lossy(&bytes).trim().to_string();
        (!line.is_empty()).then_some(line)
    }

    /// Current buffer size
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
