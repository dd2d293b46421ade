//! Line-based chat loop over stdin.

use anyhow::Result;
use rat_relay::{Command, Flow, OutputSink, Relay, Status};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::terminal::TerminalSink;

pub struct ChatRepl<W: Write + Send> {
    relay: Relay,
    sink: TerminalSink<W>,
}

impl<W: Write + Send> ChatRepl<W> {
    pub fn new(relay: Relay, sink: TerminalSink<W>) -> Self {
        Self { relay, sink }
    }

    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    pub fn banner(&mut self) {
        let title = self.sink.paint("RAT: Retrieval Augmented Thinking").bold().to_string();
        self.sink.line(title);
        self.sink.line(format!(
            "Reasoning: {}  Answering: {}",
            self.relay.reasoning_model(),
            self.relay.answering_model()
        ));
        self.sink.line("Commands:");
        self.sink.line("  'quit' or 'exit'  leave");
        self.sink.line("  'clear'           forget the conversation");
        self.sink.line("  'reasoning'       show or hide the reasoning stream");
        self.sink.line(format!(
            "  'model <name>'    change the answering model ({})",
            self.relay.answering_model()
        ));
    }

    /// Warn up front when the answering endpoint is down
    pub async fn check_endpoint(&mut self) {
        if !self.relay.answering_reachable().await {
            self.sink.write_status(Status::warning(rat_relay::relay::UNREACHABLE_HINT));
        }
    }

    /// Read lines until `quit`, `exit` or end of input.
    ///
    /// Ctrl+C at the prompt discards the line; during a turn it cancels the
    /// turn and returns to the prompt.
    pub async fn run(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            self.prompt();

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => {
                    self.sink.line("");
                    continue;
                }
            };
            let Some(line) = line else { break };

            let command = Command::parse(&line);
            tracing::debug!("Input parsed as {:?}", command);

            let flow = tokio::select! {
                flow = self.relay.handle(command, &mut self.sink) => flow,
                _ = tokio::signal::ctrl_c() => {
                    self.relay.cancel_turn();
                    self.sink.write_status(Status::warning("Interrupted"));
                    Flow::Continue
                }
            };
            if flow == Flow::Quit {
                break;
            }
        }

        self.sink.line("Goodbye!");
        Ok(())
    }

    fn prompt(&mut self) {
        let label = self.sink.paint("You:").green().bold().to_string();
        self.sink.line("");
        self.sink.write_prompt(&label);
    }
}
