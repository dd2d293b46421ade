//! Reasoning-then-answering relay.
//!
//! A turn streams a reasoning transcript from one provider, hands it to a
//! second provider through a [`HandoffPolicy`], streams the answer, and
//! commits both sides into their own histories.

pub mod command;
pub mod config;
pub mod error;
pub mod handoff;
pub mod relay;
pub mod sink;
pub mod stages;
pub mod state;

pub use command::Command;
pub use config::{FailurePolicy, RelayConfig};
pub use error::{RelayError, Result};
pub use handoff::{HandoffPayload, HandoffPolicy};
pub use relay::{Flow, Relay, TurnReport};
pub use sink::{OutputSink, Status, StatusLevel};
pub use stages::{
    format_elapsed, AnswerResult, AnsweringStage, ReasoningResult, ReasoningStage, StageOutcome,
};
pub use state::{ConversationState, TurnState};
