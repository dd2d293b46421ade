use console::{style, StyledObject};
use rat_llm::Channel;
use rat_relay::{OutputSink, Status, StatusLevel};
use std::io::{self, Write};

/// Writes the relay's output to a terminal
pub struct TerminalSink<W: Write + Send> {
    out: W,
    /// `Some(false)` forces plain text, `None` lets console decide
    colors: Option<bool>,
    mid_line: bool,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), None)
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W, colors: Option<bool>) -> Self {
        Self {
            out,
            colors,
            mid_line: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print `text` on its own line
    pub fn line(&mut self, text: impl std::fmt::Display) {
        self.end_line();
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }

    /// Write an input prompt, leaving the cursor after it
    pub fn write_prompt(&mut self, label: &str) {
        self.end_line();
        let _ = write!(self.out, "{label} ");
        let _ = self.out.flush();
    }

    pub fn paint<'a>(&self, text: &'a str) -> StyledObject<&'a str> {
        let styled = style(text);
        match self.colors {
            Some(enabled) => styled.force_styling(enabled),
            None => styled,
        }
    }

    fn end_line(&mut self) {
        if self.mid_line {
            let _ = writeln!(self.out);
            self.mid_line = false;
        }
    }
}

impl<W: Write + Send> OutputSink for TerminalSink<W> {
    fn write_fragment(&mut self, channel: Channel, text: &str) {
        if text.is_empty() {
            return;
        }
        let rendered = match channel {
            Channel::Reasoning => self.paint(text).cyan().dim().to_string(),
            Channel::Answer => self.paint(text).to_string(),
        };
        let _ = write!(self.out, "{rendered}");
        let _ = self.out.flush();
        self.mid_line = !text.ends_with('\n');
    }

    fn write_status(&mut self, status: Status) {
        let message = status.message.as_str();
        let styled = match status.level {
            StatusLevel::Heading => {
                self.end_line();
                let _ = writeln!(self.out);
                self.paint(message).green().bold()
            }
            StatusLevel::Info => self.paint(message).yellow(),
            StatusLevel::Notice => self.paint(message).magenta(),
            StatusLevel::Warning => self.paint(message).yellow().bold(),
            StatusLevel::Error => self.paint(message).red(),
        };
        let line = match status.level {
            StatusLevel::Heading => format!("{styled}:"),
            _ => styled.to_string(),
        };
        self.line(line);
    }
}
