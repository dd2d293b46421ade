use rat_llm::Channel;

/// Severity of a status line, used by sinks to pick a style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Section header, e.g. the answering model's name
    Heading,
    Info,
    /// Confirmation of a command
    Notice,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub message: String,
}

impl Status {
    pub fn new(level: StatusLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn heading(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Heading, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Info, message)
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Notice, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Error, message)
    }
}

/// Where the relay writes what the user sees
pub trait OutputSink: Send {
    /// Append a streamed fragment; no newline implied
    fn write_fragment(&mut self, channel: Channel, text: &str);

    /// Write a standalone status line
    fn write_status(&mut self, status: Status);
}
