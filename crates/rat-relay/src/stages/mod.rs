//! The two streaming stages of a turn.

pub mod answering;
pub mod reasoning;

pub use answering::{AnswerResult, AnsweringStage};
pub use reasoning::{ReasoningResult, ReasoningStage};

use futures::StreamExt;
use rat_llm::{Channel, EventStream, StreamEvent};
use std::time::Duration;

use crate::sink::OutputSink;

/// How a stage's stream ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Complete,
    /// Some fragments arrived before the stream failed; the partial text stands
    Truncated { reason: String },
    /// No fragment on either channel arrived; the stage result is a local error string
    Failed { reason: String },
}

impl StageOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

/// Render a stage duration the way status lines show it
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 60.0 {
        format!("{secs:.1} seconds")
    } else {
        format!("{:.1} minutes", secs / 60.0)
    }
}

/// Accumulated text of one channel after the stream stopped
pub(crate) struct Drained {
    pub text: String,
    pub fragments: usize,
    /// Fragments of the other channel, counted but not kept
    pub dropped: usize,
    pub error: Option<anyhow::Error>,
    pub finish_reason: Option<String>,
}

impl Drained {
    pub fn outcome(&self) -> StageOutcome {
        match &self.error {
            None => StageOutcome::Complete,
            Some(e) if self.fragments + self.dropped == 0 => StageOutcome::Failed {
                reason: format!("{e:#}"),
            },
            Some(e) => StageOutcome::Truncated {
                reason: format!("{e:#}"),
            },
        }
    }
}

/// Read `stream` to its end, keeping only `keep` fragments.
///
/// Kept fragments are written to the sink as they arrive when `echo` is set.
/// Fragments of the other channel are dropped without reaching the sink.
pub(crate) async fn drain(
    mut stream: EventStream,
    keep: Channel,
    echo: bool,
    sink: &mut dyn OutputSink,
) -> Drained {
    let mut drained = Drained {
        text: String::new(),
        fragments: 0,
        dropped: 0,
        error: None,
        finish_reason: None,
    };

    while let Some(item) = stream.next().await {
        match item {
            Ok(StreamEvent::Done { finish_reason }) => {
                drained.finish_reason = finish_reason;
            }
            Ok(event) => {
                let Some(text) = event.text() else { continue };
                if event.channel() == Some(keep) {
                    drained.fragments += 1;
                    drained.text.push_str(text);
                    if echo {
                        sink.write_fragment(keep, text);
                    }
                } else {
                    drained.dropped += 1;
                }
            }
            Err(e) => {
                drained.error = Some(e);
                break;
            }
        }
    }

    if drained.dropped > 0 {
        tracing::debug!(
            "Dropped {} fragments outside the {:?} channel",
            drained.dropped,
            keep
        );
    }
    drained
}
