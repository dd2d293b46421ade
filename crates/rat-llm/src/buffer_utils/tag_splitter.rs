use crate::streaming::{Channel, StreamEvent};

const OPEN_TAG: &str = "<think>";
const CLOSE_TAG: &str = "</think>";

/// Splits inline `<think>` spans out of a content stream
///
/// Text inside the tags is reasoning, text outside is answer. Tags may arrive
/// split across deltas; a possible partial tag is held back until the next
/// push decides it.
#[derive(Debug, Default)]
pub struct ThinkTagSplitter {
    inside: bool,
    pending: String,
}

impl ThinkTagSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: &str) -> Vec<StreamEvent> {
        let mut input = std::mem::take(&mut self.pending);
        input.push_str(text);

        let mut events = Vec::new();
        let mut rest = input.as_str();
        loop {
            let tag = if self.inside { CLOSE_TAG } else { OPEN_TAG };
            if let Some(pos) = rest.find(tag) {
                self.emit(&rest[..pos], &mut events);
                rest = &rest[pos + tag.len()..];
                self.inside = !self.inside;
                continue;
            }

            let keep = partial_tag_len(rest, tag);
            let (ready, held) = rest.split_at(rest.len() - keep);
            self.emit(ready, &mut events);
            self.pending = held.to_string();
            break;
        }
        events
    }

    /// Release any held-back text at end of stream
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let held = std::mem::take(&mut self.pending);
        let mut events = Vec::new();
        self.emit(&held, &mut events);
        events
    }

    fn current_channel(&self) -> Channel {
        if self.inside {
            Channel::Reasoning
        } else {
            Channel::Answer
        }
    }

    fn emit(&self, text: &str, events: &mut Vec<StreamEvent>) {
        if !text.is_empty() {
            events.push(StreamEvent::fragment(self.current_channel(), text));
        }
    }
}

/// Length of the longest suffix of `text` that starts `tag`
fn partial_tag_len(text: &str, tag: &str) -> usize {
    (1..tag.len())
        .rev()
        .find(|&k| text.ends_with(&tag[..k]))
        .unwrap_or(0)
}
