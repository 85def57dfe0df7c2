//! Tests for the streaming run path.

mod common;

use std::sync::{Arc, Mutex};

use futures::StreamExt;
use pretty_assertions::assert_eq;

use common::{MockProvider, DEFAULT_RESPONSE};
use murmur::prelude::*;

fn orchestrator(provider: &Arc<MockProvider>) -> Orchestrator {
    let provider: Arc<dyn ChatProvider> = provider.clone();
    Orchestrator::from_provider(provider)
}

async fn collect(
    orchestrator: &Orchestrator,
    agent: Agent,
    messages: Vec<Message>,
) -> Vec<StreamItem> {
    orchestrator
        .run_stream(agent, messages, ContextVariables::new(), RunOptions::default())
        .map(|item| item.unwrap())
        .collect()
        .await
}

#[tokio::test]
async fn simple_stream_is_delimited_and_reassembles() {
    let provider = Arc::new(MockProvider::new(vec![Message::assistant("Hello world")]));
    let agent = Agent::new("Test Agent", "gpt-4o");

    let items = collect(
        &orchestrator(&provider),
        agent,
        vec![Message::user("hi")],
    )
    .await;

    assert!(matches!(items[0], StreamItem::TurnStart));
    assert!(matches!(items[items.len() - 2], StreamItem::TurnEnd));

    let text: String = items
        .iter()
        .filter_map(|item| match item {
            StreamItem::Delta(d) => d.content.clone(),
            _ => None,
        })
        .collect();
    assert_eq!(text, "Hello world");

    // Every forwarded delta carries the sender tag.
    for item in &items {
        if let StreamItem::Delta(d) = item {
            assert_eq!(d.sender.as_deref(), Some("Test Agent"));
        }
    }

    let StreamItem::Done(response) = items.last().unwrap() else {
        panic!("last item must be the response");
    };
    assert_eq!(response.messages.len(), 1);
    assert_eq!(response.messages[0].content.as_deref(), Some("Hello world"));
    assert_eq!(response.messages[0].sender.as_deref(), Some("Test Agent"));
    assert_eq!(response.agent.as_ref().unwrap().name(), "Test Agent");
}

#[tokio::test]
async fn streamed_tool_round_trip_matches_blocking_path() {
    let provider = Arc::new(MockProvider::new(vec![
        Message::assistant_with_tool_calls(
            None,
            vec![ToolCall::new(
                "call_1",
                "get_weather",
                r#"{"location":"San Francisco"}"#,
            )],
        ),
        Message::assistant(DEFAULT_RESPONSE),
    ]));

    let seen_location = Arc::new(Mutex::new(None::<String>));
    let get_weather = {
        let seen_location = Arc::clone(&seen_location);
        FunctionTool::new(
            "get_weather",
            "Get the current weather for a location.",
            ToolParameters::object()
                .string("location", "City name", true)
                .build(),
            move |args, _ctx| {
                let seen = Arc::clone(&seen_location);
                async move {
                    let location = args.get_str("location")?.to_string();
                    *seen.lock().unwrap() = Some(location);
                    Ok(ToolReturn::from("It's sunny today."))
                }
            },
        )
    };
    let agent = Agent::new("Test Agent", "gpt-4o").with_tool(Arc::new(get_weather));

    let items = collect(
        &orchestrator(&provider),
        agent,
        vec![Message::user("What's the weather in San Francisco?")],
    )
    .await;

    // Two turns, each delimited.
    let starts = items
        .iter()
        .filter(|i| matches!(i, StreamItem::TurnStart))
        .count();
    let ends = items
        .iter()
        .filter(|i| matches!(i, StreamItem::TurnEnd))
        .count();
    assert_eq!(starts, 2);
    assert_eq!(ends, 2);

    // The fragmented arguments were reassembled before execution.
    assert_eq!(
        seen_location.lock().unwrap().as_deref(),
        Some("San Francisco")
    );

    let StreamItem::Done(response) = items.last().unwrap() else {
        panic!("last item must be the response");
    };
    assert_eq!(response.messages.len(), 3);
    assert_eq!(response.messages[0].tool_calls().len(), 1);
    assert_eq!(
        response.messages[0].tool_calls()[0].arguments,
        r#"{"location":"San Francisco"}"#
    );
    assert_eq!(
        response.messages[1].content.as_deref(),
        Some("It's sunny today.")
    );
    assert_eq!(
        response.messages[2].content.as_deref(),
        Some(DEFAULT_RESPONSE)
    );
}

#[tokio::test]
async fn stream_respects_turn_budget() {
    let provider = Arc::new(MockProvider::repeating(Message::assistant_with_tool_calls(
        None,
        vec![ToolCall::new("call_1", "again", "{}")],
    )));

    let again = FunctionTool::new(
        "again",
        "Ask for another turn.",
        ToolParameters::empty(),
        |_args, _ctx| async move { Ok(ToolReturn::from("again")) },
    );
    let agent = Agent::new("Looper", "gpt-4o").with_tool(Arc::new(again));

    let items: Vec<StreamItem> = orchestrator(&provider)
        .run_stream(
            agent,
            vec![Message::user("loop forever")],
            ContextVariables::new(),
            RunOptions::builder().max_turns(2).build(),
        )
        .map(|item| item.unwrap())
        .collect()
        .await;

    assert_eq!(provider.requests().len(), 2);
    assert!(matches!(items.last().unwrap(), StreamItem::Done(_)));
}

#[tokio::test]
async fn stream_execute_tools_false_stops_after_first_turn() {
    let provider = Arc::new(MockProvider::new(vec![Message::assistant_with_tool_calls(
        None,
        vec![ToolCall::new("call_1", "get_weather", "{}")],
    )]));

    let agent = Agent::new("Test Agent", "gpt-4o");

    let items: Vec<StreamItem> = orchestrator(&provider)
        .run_stream(
            agent,
            vec![Message::user("hi")],
            ContextVariables::new(),
            RunOptions::builder().execute_tools(false).build(),
        )
        .map(|item| item.unwrap())
        .collect()
        .await;

    let StreamItem::Done(response) = items.last().unwrap() else {
        panic!("last item must be the response");
    };
    assert_eq!(response.messages.len(), 1);
    assert_eq!(response.messages[0].tool_calls().len(), 1);
}
