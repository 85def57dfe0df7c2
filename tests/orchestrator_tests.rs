//! Tests for the orchestration core against a scripted mock backend.

mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;

use common::{MockProvider, DEFAULT_RESPONSE};
use murmur::prelude::*;

fn orchestrator(provider: &Arc<MockProvider>) -> Orchestrator {
    let provider: Arc<dyn ChatProvider> = provider.clone();
    Orchestrator::from_provider(provider)
}

fn weather_call(arguments: &str) -> Message {
    Message::assistant_with_tool_calls(
        None,
        vec![ToolCall::new("call_1", "get_weather", arguments)],
    )
}

fn weather_tool(seen_location: Arc<Mutex<Option<String>>>) -> FunctionTool {
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
}

#[tokio::test]
async fn run_without_tool_calls_returns_one_message() {
    let provider = Arc::new(MockProvider::new(vec![Message::assistant(DEFAULT_RESPONSE)]));
    let agent = Agent::new("Test Agent", "gpt-4o").with_instructions("Test instructions");

    let response = orchestrator(&provider)
        .run(
            agent,
            vec![Message::user("Hello, how are you?")],
            ContextVariables::new(),
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(response.messages.len(), 1);
    assert_eq!(response.messages[0].content.as_deref(), Some(DEFAULT_RESPONSE));
    assert_eq!(response.messages[0].sender.as_deref(), Some("Test Agent"));
    assert_eq!(response.agent.unwrap().name(), "Test Agent");
}

#[tokio::test]
async fn tool_round_trip_grows_history_by_three() {
    let provider = Arc::new(MockProvider::new(vec![
        weather_call(r#"{"location":"San Francisco"}"#),
        Message::assistant(DEFAULT_RESPONSE),
    ]));

    let seen_location = Arc::new(Mutex::new(None));
    let agent = Agent::new("Test Agent", "gpt-4o")
        .with_instructions("Test instructions")
        .with_tool(Arc::new(weather_tool(Arc::clone(&seen_location))));

    let response = orchestrator(&provider)
        .run(
            agent,
            vec![Message::user("What's the weather like in San Francisco?")],
            ContextVariables::new(),
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(
        seen_location.lock().unwrap().as_deref(),
        Some("San Francisco")
    );
    assert_eq!(response.messages.len(), 3);

    let tool_message = &response.messages[1];
    assert_eq!(tool_message.role, Role::Tool);
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(tool_message.tool_name.as_deref(), Some("get_weather"));
    assert_eq!(tool_message.content.as_deref(), Some("It's sunny today."));

    assert_eq!(
        response.messages[2].content.as_deref(),
        Some(DEFAULT_RESPONSE)
    );
}

#[tokio::test]
async fn execute_tools_false_returns_tool_call_verbatim() {
    let provider = Arc::new(MockProvider::new(vec![weather_call(
        r#"{"location":"San Francisco"}"#,
    )]));

    let seen_location = Arc::new(Mutex::new(None));
    let agent = Agent::new("Test Agent", "gpt-4o")
        .with_tool(Arc::new(weather_tool(Arc::clone(&seen_location))));

    let response = orchestrator(&provider)
        .run(
            agent,
            vec![Message::user("What's the weather?")],
            ContextVariables::new(),
            RunOptions::builder().execute_tools(false).build(),
        )
        .await
        .unwrap();

    assert!(seen_location.lock().unwrap().is_none());
    assert_eq!(response.messages.len(), 1);

    let calls = response.messages[0].tool_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "get_weather");
    assert_eq!(calls[0].arguments, r#"{"location":"San Francisco"}"#);
}

#[tokio::test]
async fn handoff_replaces_active_agent() {
    let provider = Arc::new(MockProvider::new(vec![
        Message::assistant_with_tool_calls(
            None,
            vec![ToolCall::new("call_1", "transfer_to_agent2", "{}")],
        ),
        Message::assistant(DEFAULT_RESPONSE),
    ]));

    let agent2 = Agent::new("Test Agent 2", "gpt-4o").with_instructions("Test instructions 2");
    let transfer = {
        let agent2 = agent2.clone();
        FunctionTool::new(
            "transfer_to_agent2",
            "Transfer to agent 2.",
            ToolParameters::empty(),
            move |_args, _ctx| {
                let agent2 = agent2.clone();
                async move { Ok(ToolReturn::from(agent2)) }
            },
        )
    };
    let agent1 = Agent::new("Test Agent 1", "gpt-4o")
        .with_instructions("Test instructions 1")
        .with_tool(Arc::new(transfer));

    let response = orchestrator(&provider)
        .run(
            agent1,
            vec![Message::user("I want to talk to agent 2")],
            ContextVariables::new(),
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(response.messages.len(), 3);
    assert_eq!(
        response.messages[1].content.as_deref(),
        Some(r#"{"assistant":"Test Agent 2"}"#)
    );
    assert_eq!(
        response.messages[2].content.as_deref(),
        Some(DEFAULT_RESPONSE)
    );
    assert_eq!(response.agent.unwrap().name(), "Test Agent 2");

    // The second turn runs as the new agent.
    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].messages[0].content.as_deref(),
        Some("Test instructions 2")
    );
}

#[tokio::test]
async fn first_handoff_wins_and_skips_remaining_calls() {
    let provider = Arc::new(MockProvider::new(vec![
        Message::assistant_with_tool_calls(
            None,
            vec![
                ToolCall::new("call_1", "transfer_to_agent2", "{}"),
                ToolCall::new("call_2", "record", "{}"),
            ],
        ),
        Message::assistant(DEFAULT_RESPONSE),
    ]));

    let agent2 = Agent::new("Test Agent 2", "gpt-4o");
    let transfer = {
        let agent2 = agent2.clone();
        FunctionTool::new(
            "transfer_to_agent2",
            "Transfer to agent 2.",
            ToolParameters::empty(),
            move |_args, _ctx| {
                let agent2 = agent2.clone();
                async move { Ok(ToolReturn::from(agent2)) }
            },
        )
    };

    let record_called = Arc::new(AtomicBool::new(false));
    let record = {
        let record_called = Arc::clone(&record_called);
        FunctionTool::new(
            "record",
            "Record something.",
            ToolParameters::empty(),
            move |_args, _ctx| {
                let record_called = Arc::clone(&record_called);
                async move {
                    record_called.store(true, Ordering::SeqCst);
                    Ok(ToolReturn::from("recorded"))
                }
            },
        )
    };

    let agent1 = Agent::new("Test Agent 1", "gpt-4o")
        .with_tool(Arc::new(transfer))
        .with_tool(Arc::new(record));

    let response = orchestrator(&provider)
        .run(
            agent1,
            vec![Message::user("hi")],
            ContextVariables::new(),
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert!(!record_called.load(Ordering::SeqCst));
    // assistant + one tool result (the handoff) + final assistant
    assert_eq!(response.messages.len(), 3);
    assert_eq!(response.agent.unwrap().name(), "Test Agent 2");
}

#[tokio::test]
async fn context_variables_propagate_between_turns() {
    let provider = Arc::new(MockProvider::new(vec![
        Message::assistant_with_tool_calls(
            None,
            vec![ToolCall::new("call_1", "save_info", "{}")],
        ),
        Message::assistant_with_tool_calls(
            None,
            vec![ToolCall::new("call_2", "read_info", "{}")],
        ),
        Message::assistant(DEFAULT_RESPONSE),
    ]));

    let save_info = FunctionTool::new(
        "save_info",
        "Save a fact.",
        ToolParameters::empty(),
        |_args, _ctx| async move {
            let mut vars = ContextVariables::new();
            vars.insert("k", "v");
            Ok(ToolReturn::from(
                ToolOutput::new("saved").with_context_variables(vars),
            ))
        },
    );

    let observed = Arc::new(Mutex::new(None::<ContextVariables>));
    let read_info = {
        let observed = Arc::clone(&observed);
        FunctionTool::new(
            "read_info",
            "Read the saved fact.",
            ToolParameters::empty(),
            move |_args, ctx| {
                let observed = Arc::clone(&observed);
                async move {
                    *observed.lock().unwrap() = ctx.context_variables;
                    Ok(ToolReturn::from("read"))
                }
            },
        )
        .with_context()
    };

    let agent = Agent::new("Test Agent", "gpt-4o")
        .with_tool(Arc::new(save_info))
        .with_tool(Arc::new(read_info));

    let response = orchestrator(&provider)
        .run(
            agent,
            vec![Message::user("remember this")],
            ContextVariables::new(),
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(response.context_variables.get_str("k"), Some("v"));
    let observed = observed.lock().unwrap().clone().unwrap();
    assert_eq!(observed.get_str("k"), Some("v"));
}

#[tokio::test]
async fn tools_without_declaration_see_no_context() {
    let provider = Arc::new(MockProvider::new(vec![
        Message::assistant_with_tool_calls(None, vec![ToolCall::new("call_1", "plain", "{}")]),
        Message::assistant(DEFAULT_RESPONSE),
    ]));

    let saw_context = Arc::new(AtomicBool::new(false));
    let plain = {
        let saw_context = Arc::clone(&saw_context);
        FunctionTool::new(
            "plain",
            "A tool that never asked for context.",
            ToolParameters::empty(),
            move |_args, ctx| {
                let saw_context = Arc::clone(&saw_context);
                async move {
                    saw_context.store(ctx.context_variables.is_some(), Ordering::SeqCst);
                    Ok(ToolReturn::from("ok"))
                }
            },
        )
    };

    let agent = Agent::new("Test Agent", "gpt-4o").with_tool(Arc::new(plain));

    let mut vars = ContextVariables::new();
    vars.insert("secret", "value");
    orchestrator(&provider)
        .run(
            agent,
            vec![Message::user("go")],
            vars,
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert!(!saw_context.load(Ordering::SeqCst));
}

#[tokio::test]
async fn turn_budget_bounds_backend_calls() {
    let provider = Arc::new(MockProvider::repeating(Message::assistant_with_tool_calls(
        None,
        vec![ToolCall::new("call_1", "again", "{}")],
    )));

    let invocations = Arc::new(AtomicUsize::new(0));
    let again = {
        let invocations = Arc::clone(&invocations);
        FunctionTool::new(
            "again",
            "Ask for another turn.",
            ToolParameters::empty(),
            move |_args, _ctx| {
                let invocations = Arc::clone(&invocations);
                async move {
                    invocations.fetch_add(1, Ordering::SeqCst);
                    Ok(ToolReturn::from("again"))
                }
            },
        )
    };

    let agent = Agent::new("Looper", "gpt-4o").with_tool(Arc::new(again));

    let response = orchestrator(&provider)
        .run(
            agent,
            vec![Message::user("loop forever")],
            ContextVariables::new(),
            RunOptions::builder().max_turns(3).build(),
        )
        .await
        .unwrap();

    assert_eq!(provider.requests().len(), 3);
    assert_eq!(invocations.load(Ordering::SeqCst), 3);
    // Each turn appended an assistant message and a tool result.
    assert_eq!(response.messages.len(), 6);
}

#[tokio::test]
async fn unknown_tool_is_folded_into_history() {
    let provider = Arc::new(MockProvider::new(vec![
        Message::assistant_with_tool_calls(
            None,
            vec![ToolCall::new("call_1", "missing_tool", "{}")],
        ),
        Message::assistant(DEFAULT_RESPONSE),
    ]));

    let agent = Agent::new("Test Agent", "gpt-4o");

    let response = orchestrator(&provider)
        .run(
            agent,
            vec![Message::user("hi")],
            ContextVariables::new(),
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(response.messages.len(), 3);
    let tool_message = &response.messages[1];
    assert_eq!(tool_message.role, Role::Tool);
    assert!(tool_message.text().contains("not found"));
}

#[tokio::test]
async fn malformed_arguments_are_folded_into_history() {
    let provider = Arc::new(MockProvider::new(vec![
        weather_call("{not json"),
        Message::assistant(DEFAULT_RESPONSE),
    ]));

    let seen_location = Arc::new(Mutex::new(None));
    let agent = Agent::new("Test Agent", "gpt-4o")
        .with_tool(Arc::new(weather_tool(Arc::clone(&seen_location))));

    let response = orchestrator(&provider)
        .run(
            agent,
            vec![Message::user("hi")],
            ContextVariables::new(),
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert!(seen_location.lock().unwrap().is_none());
    assert!(response.messages[1].text().contains("invalid arguments"));
    assert_eq!(
        response.messages[2].content.as_deref(),
        Some(DEFAULT_RESPONSE)
    );
}

#[tokio::test]
async fn tool_body_failure_is_folded_into_history() {
    let provider = Arc::new(MockProvider::new(vec![
        Message::assistant_with_tool_calls(None, vec![ToolCall::new("call_1", "flaky", "{}")]),
        Message::assistant(DEFAULT_RESPONSE),
    ]));

    let flaky = FunctionTool::new(
        "flaky",
        "Always fails.",
        ToolParameters::empty(),
        |_args, _ctx| async move {
            Err(MurmurError::tool("flaky", "database unreachable"))
        },
    );
    let agent = Agent::new("Test Agent", "gpt-4o").with_tool(Arc::new(flaky));

    let response = orchestrator(&provider)
        .run(
            agent,
            vec![Message::user("hi")],
            ContextVariables::new(),
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(response.messages.len(), 3);
    assert!(response.messages[1].text().starts_with("Error:"));
    assert!(response.messages[1].text().contains("database unreachable"));
}

#[tokio::test]
async fn dynamic_instructions_see_context_variables() {
    let provider = Arc::new(MockProvider::new(vec![Message::assistant(DEFAULT_RESPONSE)]));

    let agent = Agent::new("Test Agent", "gpt-4o").with_instructions(Instructions::Dynamic(
        Arc::new(|vars: &ContextVariables| {
            format!(
                "Help {} with their questions.",
                vars.get_str("user_name").unwrap_or("the user")
            )
        }),
    ));

    let mut vars = ContextVariables::new();
    vars.insert("user_name", "Ada");
    orchestrator(&provider)
        .run(
            agent,
            vec![Message::user("hi")],
            vars,
            RunOptions::default(),
        )
        .await
        .unwrap();

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    let system = &requests[0].messages[0];
    assert_eq!(system.role, Role::System);
    assert_eq!(
        system.content.as_deref(),
        Some("Help Ada with their questions.")
    );
}

#[tokio::test]
async fn model_override_wins_over_agent_model() {
    let provider = Arc::new(MockProvider::new(vec![Message::assistant(DEFAULT_RESPONSE)]));
    let agent = Agent::new("Test Agent", "gpt-4o");

    orchestrator(&provider)
        .run(
            agent,
            vec![Message::user("hi")],
            ContextVariables::new(),
            RunOptions::builder()
                .model_override("gpt-4o-mini".to_string())
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(provider.requests()[0].model, "gpt-4o-mini");
}

#[tokio::test]
async fn request_carries_tool_descriptors_without_reserved_parameter() {
    let provider = Arc::new(MockProvider::new(vec![Message::assistant(DEFAULT_RESPONSE)]));

    let tool = FunctionTool::new(
        "lookup",
        "Look something up.",
        ToolParameters::from_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "context_variables": {"type": "object"},
            },
            "required": ["query", "context_variables"],
        })),
        |_args, _ctx| async move { Ok(ToolReturn::from("found")) },
    )
    .with_context();

    let agent = Agent::new("Test Agent", "gpt-4o").with_tool(Arc::new(tool));

    orchestrator(&provider)
        .run(
            agent,
            vec![Message::user("hi")],
            ContextVariables::new(),
            RunOptions::default(),
        )
        .await
        .unwrap();

    let tools = &provider.requests()[0].tools;
    assert_eq!(tools.len(), 1);
    assert!(tools[0].parameters["properties"]
        .get("context_variables")
        .is_none());
    assert_eq!(tools[0].parameters["required"], serde_json::json!(["query"]));
}
