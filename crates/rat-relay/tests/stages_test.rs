mod common;

use common::{RecordingSink, Script, ScriptedClient};
use proptest::prelude::*;
use rat_llm::{Channel, Message, StreamEvent};
use rat_relay::{
    format_elapsed, AnsweringStage, ConversationState, HandoffPolicy, ReasoningStage,
    StageOutcome, StatusLevel,
};
use std::time::Duration;

/// Split `text` at the given char offsets
fn rechunk(text: &str, cuts: &[usize]) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut offsets: Vec<usize> = cuts.iter().map(|c| c % (chars.len() + 1)).collect();
    offsets.sort_unstable();
    offsets.dedup();

    let mut chunks = Vec::new();
    let mut start = 0;
    for offset in offsets.into_iter().chain(std::iter::once(chars.len())) {
        chunks.push(chars[start..offset].iter().collect());
        start = offset;
    }
    chunks
}

fn run_reasoning(fragments: Vec<String>, show: bool) -> (String, RecordingSink) {
    let events = fragments
        .into_iter()
        .map(|f| StreamEvent::fragment(Channel::Reasoning, f))
        .collect();
    let client = ScriptedClient::new("r", vec![Script::Stream(events, None)]);
    let stage = ReasoningStage::new(client, "r1");
    let mut state = ConversationState::new();
    let mut sink = RecordingSink::new();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let result = runtime.block_on(stage.run(&mut state, "q", show, &mut sink));
    (result.transcript, sink)
}

proptest! {
    #[test]
    fn transcript_is_independent_of_chunking(
        text in "[a-zA-Z0-9 .,+=?éü\n]{0,64}",
        cuts in proptest::collection::vec(0usize..80, 0..8),
    ) {
        let (whole, _) = run_reasoning(vec![text.clone()], false);
        let (split, sink) = run_reasoning(rechunk(&text, &cuts), true);

        prop_assert_eq!(&whole, &text);
        prop_assert_eq!(&split, &text);
        prop_assert_eq!(sink.fragments(Channel::Reasoning), text);
    }

    #[test]
    fn handoff_encoding_is_deterministic(
        query in ".{0,40}",
        transcript in ".{0,80}",
    ) {
        for policy in [HandoffPolicy::Prefill, HandoffPolicy::Template, HandoffPolicy::SystemPrompt] {
            let first = policy.encode(&query, &transcript);
            let second = policy.encode(&query, &transcript);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.messages().iter().any(|m| m.content().to_text().contains(&query)));
            prop_assert!(first.messages().iter().any(|m| m.content().to_text().contains(&transcript)));
        }
    }
}

#[tokio::test]
async fn test_reasoning_with_no_fragments_is_empty() {
    let client = ScriptedClient::new("r", vec![Script::reasoning(&[])]);
    let stage = ReasoningStage::new(client, "r1");
    let mut state = ConversationState::new();
    let mut sink = RecordingSink::new();

    let result = stage.run(&mut state, "q", true, &mut sink).await;

    assert_eq!(result.transcript, "");
    assert_eq!(result.outcome, StageOutcome::Complete);
    assert_eq!(sink.statuses(StatusLevel::Heading), vec!["Reasoning Process"]);
}

#[tokio::test]
async fn test_reasoning_truncated_keeps_partial() {
    let client = ScriptedClient::new(
        "r",
        vec![Script::Stream(
            vec![StreamEvent::fragment(Channel::Reasoning, "half a thought")],
            Some("stream reset".into()),
        )],
    );
    let stage = ReasoningStage::new(client, "r1");
    let mut state = ConversationState::new();
    let mut sink = RecordingSink::new();

    let result = stage.run(&mut state, "q", false, &mut sink).await;

    assert_eq!(result.transcript, "half a thought");
    assert!(result.outcome.is_truncated());
    assert_eq!(sink.statuses(StatusLevel::Warning).len(), 1);
    assert!(sink.fragments(Channel::Reasoning).is_empty());
}

#[tokio::test]
async fn test_answer_text_then_error_is_truncated_not_failed() {
    let client = ScriptedClient::new(
        "r",
        vec![Script::Stream(
            vec![StreamEvent::fragment(Channel::Answer, "4")],
            Some("connection reset".into()),
        )],
    );
    let stage = ReasoningStage::new(client, "r1");
    let mut state = ConversationState::new();
    let mut sink = RecordingSink::new();

    let result = stage.run(&mut state, "2+2?", true, &mut sink).await;

    assert_eq!(result.transcript, "");
    assert_eq!(
        result.outcome,
        StageOutcome::Truncated {
            reason: "connection reset".into()
        }
    );
    assert!(sink.statuses(StatusLevel::Error).is_empty());
    assert!(sink.fragments(Channel::Answer).is_empty());
}

#[tokio::test]
async fn test_reasoning_elapsed_covers_the_stream() {
    let pause = Duration::from_millis(100);
    let client = ScriptedClient::new(
        "r",
        vec![Script::Slow(
            pause,
            vec![
                StreamEvent::fragment(Channel::Reasoning, "Let's "),
                StreamEvent::fragment(Channel::Reasoning, "compute: 2+2=4"),
                StreamEvent::Done {
                    finish_reason: Some("stop".into()),
                },
            ],
        )],
    );
    let stage = ReasoningStage::new(client, "r1");
    let mut state = ConversationState::new();
    let mut sink = RecordingSink::new();

    let result = stage.run(&mut state, "2+2?", false, &mut sink).await;

    assert_eq!(result.transcript, "Let's compute: 2+2=4");
    assert!(result.elapsed >= pause * 3);
    assert!(result.elapsed < Duration::from_secs(60));
    assert_eq!(
        sink.statuses(StatusLevel::Info),
        vec![format!("Thought for {}", format_elapsed(result.elapsed))]
    );
    assert!(sink.statuses(StatusLevel::Info)[0].ends_with(" seconds"));
}

#[tokio::test]
async fn test_reasoning_refused_never_raises() {
    let client = ScriptedClient::new("r", vec![Script::Refuse("dns error".into())]);
    let stage = ReasoningStage::new(client, "r1");
    let mut state = ConversationState::new();
    let mut sink = RecordingSink::new();

    let result = stage.run(&mut state, "q", true, &mut sink).await;

    assert_eq!(result.transcript, "Reasoning model error: dns error");
    assert_eq!(
        result.outcome,
        StageOutcome::Failed {
            reason: "dns error".into()
        }
    );
    assert_eq!(state.reasoning_history(), &[Message::human("q")]);
}

#[tokio::test]
async fn test_answering_sends_history_then_payload() {
    let client = ScriptedClient::new("a", vec![Script::answer(&["4"])]);
    let stage = AnsweringStage::new(client.clone());
    let mut state = ConversationState::new();
    state.record_query("earlier");
    state.commit("earlier", "reply");
    let payload = HandoffPolicy::SystemPrompt.encode("2+2?", "four");
    let mut sink = RecordingSink::new();

    let result = stage.run(&state, &payload, "gpt-4o-mini", &mut sink).await;

    assert_eq!(result.answer, "4");
    let sent = &client.requests()[0];
    assert_eq!(sent.model, "gpt-4o-mini");
    assert_eq!(sent.messages.len(), 4);
    assert_eq!(&sent.messages[..2], state.answering_history());
    assert_eq!(&sent.messages[2..], payload.messages());
    // the stage itself never writes history
    assert_eq!(state.answering_history().len(), 2);
    assert_eq!(sink.statuses(StatusLevel::Heading), vec!["gpt-4o-mini"]);
}

#[tokio::test]
async fn test_answering_error_before_fragments() {
    let client = ScriptedClient::new("a", vec![Script::Stream(Vec::new(), Some("503".into()))]);
    let stage = AnsweringStage::new(client);
    let state = ConversationState::new();
    let payload = HandoffPolicy::Template.encode("q", "t");
    let mut sink = RecordingSink::new();

    let result = stage.run(&state, &payload, "m", &mut sink).await;

    assert_eq!(result.answer, "Error occurred while streaming response");
    assert!(result.outcome.is_failed());
    assert!(sink.fragments(Channel::Answer).is_empty());
    assert_eq!(sink.statuses(StatusLevel::Error).len(), 1);
}
