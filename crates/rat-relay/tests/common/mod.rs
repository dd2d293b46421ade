#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::StreamExt;
use rat_llm::{Channel, ChatClient, ChatRequest, EventStream, StreamEvent};
use rat_relay::{OutputSink, Status, StatusLevel};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted response
#[derive(Clone)]
pub enum Script {
    /// `chat_stream` itself fails
    Refuse(String),
    /// Items yielded in order, then an optional terminal error
    Stream(Vec<StreamEvent>, Option<String>),
    /// Items yielded in order, then the stream never ends
    Hang(Vec<StreamEvent>),
    /// Items yielded in order, each after a pause
    Slow(Duration, Vec<StreamEvent>),
}

impl Script {
    pub fn reasoning(fragments: &[&str]) -> Self {
        Self::Stream(events(Channel::Reasoning, fragments), None)
    }

    pub fn answer(fragments: &[&str]) -> Self {
        Self::Stream(events(Channel::Answer, fragments), None)
    }
}

pub fn events(channel: Channel, fragments: &[&str]) -> Vec<StreamEvent> {
    let mut events: Vec<StreamEvent> = fragments
        .iter()
        .map(|f| StreamEvent::fragment(channel, *f))
        .collect();
    events.push(StreamEvent::Done {
        finish_reason: Some("stop".into()),
    });
    events
}

/// In-memory client that replays scripts and records every request
pub struct ScriptedClient {
    name: String,
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ChatRequest>>,
    healthy: bool,
}

impl ScriptedClient {
    pub fn new(name: &str, scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
            healthy: true,
        })
    }

    pub fn unhealthy(name: &str, scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
            healthy: false,
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    fn provider(&self) -> &str {
        &self.name
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        self.requests.lock().unwrap().push(request);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted response left"))?;

        match script {
            Script::Refuse(cause) => Err(anyhow!(cause)),
            Script::Stream(events, error) => {
                let mut items: Vec<Result<StreamEvent>> = events.into_iter().map(Ok).collect();
                if let Some(cause) = error {
                    items.push(Err(anyhow!(cause)));
                }
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Script::Hang(events) => {
                let items: Vec<Result<StreamEvent>> = events.into_iter().map(Ok).collect();
                Ok(Box::pin(
                    futures::stream::iter(items).chain(futures::stream::pending()),
                ))
            }
            Script::Slow(pause, events) => {
                let items: Vec<Result<StreamEvent>> = events.into_iter().map(Ok).collect();
                Ok(Box::pin(futures::stream::iter(items).then(move |item| async move {
                    tokio::time::sleep(pause).await;
                    item
                })))
            }
        }
    }

    async fn health_check(&self) -> Result<()> {
        if self.healthy {
            Ok(())
        } else {
            Err(anyhow!("connection refused"))
        }
    }
}

/// Everything written to a sink, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Fragment(Channel, String),
    Status(StatusLevel, String),
}

#[derive(Default)]
pub struct RecordingSink {
    pub outputs: Vec<Output>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fragments(&self, channel: Channel) -> String {
        self.outputs
            .iter()
            .filter_map(|o| match o {
                Output::Fragment(c, text) if *c == channel => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self, level: StatusLevel) -> Vec<String> {
        self.outputs
            .iter()
            .filter_map(|o| match o {
                Output::Status(l, text) if *l == level => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn has_status(&self, needle: &str) -> bool {
        self.outputs
            .iter()
            .any(|o| matches!(o, Output::Status(_, text) if text.contains(needle)))
    }
}

impl OutputSink for RecordingSink {
    fn write_fragment(&mut self, channel: Channel, text: &str) {
        self.outputs.push(Output::Fragment(channel, text.to_string()));
    }

    fn write_status(&mut self, status: Status) {
        self.outputs.push(Output::Status(status.level, status.message));
    }
}
