//! The turn loop: compose request, complete, record, execute tools, hand off.

use std::sync::Arc;

use bon::Builder;
use tracing::{debug, warn};

use crate::agent::Agent;
use crate::config::Config;
use crate::error::{MurmurError, Result};
use crate::provider::{create_provider, ChatProvider, ChatRequest, ProviderKind};
use crate::tools::{schema, ToolArguments, ToolContext};
use crate::types::{ContextVariables, Message, RunResponse, ToolCall, ToolOutput, ToolReturn};

/// Options for one run.
#[derive(Debug, Clone, Builder)]
pub struct RunOptions {
    /// Model id overriding the active agent's configured model.
    pub model_override: Option<String>,
    /// Turn budget; `None` means unbounded.
    pub max_turns: Option<usize>,
    /// When false, a tool-call-bearing assistant message ends the run
    /// without invoking any tool.
    #[builder(default = true)]
    pub execute_tools: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            model_override: None,
            max_turns: None,
            execute_tools: true,
        }
    }
}

/// Drives one conversation to completion against a single chat backend.
pub struct Orchestrator {
    pub(crate) provider: Arc<dyn ChatProvider>,
}

impl Orchestrator {
    /// Create an orchestrator for the given backend, configured from the
    /// environment.
    pub fn new(kind: ProviderKind) -> Result<Self> {
        Self::with_config(kind, &Config::from_env())
    }

    /// Create an orchestrator for the given backend and config.
    pub fn with_config(kind: ProviderKind, config: &Config) -> Result<Self> {
        Ok(Self {
            provider: Arc::from(create_provider(kind, config)?),
        })
    }

    /// Create an orchestrator over an existing backend instance.
    pub fn from_provider(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    /// Run the turn loop to completion.
    ///
    /// Each run owns its state: the supplied history, context variables, and
    /// agent are taken by value and never shared with other runs.
    pub async fn run(
        &self,
        agent: Agent,
        messages: Vec<Message>,
        context_variables: ContextVariables,
        options: RunOptions,
    ) -> Result<RunResponse> {
        let mut active_agent = agent;
        let mut context_variables = context_variables;
        let mut history = messages;
        let init_len = history.len();
        let mut turn = 0usize;

        while options.max_turns.map_or(true, |max| turn < max) {
            turn += 1;

            let request = build_chat_request(
                &active_agent,
                &history,
                &context_variables,
                options.model_override.as_deref(),
            );
            debug!(
                agent = active_agent.name(),
                model = %request.model,
                turn,
                "requesting completion"
            );

            let mut message = self.provider.complete(&request).await?;
            message.sender = Some(active_agent.name().to_string());
            debug!(
                agent = active_agent.name(),
                tool_calls = message.tool_calls().len(),
                "received completion"
            );

            let calls = message.tool_calls().to_vec();
            history.push(message);

            if calls.is_empty() || !options.execute_tools {
                debug!("ending turn");
                break;
            }

            let outcome = execute_tool_calls(&calls, &active_agent, &context_variables).await?;
            history.extend(outcome.messages);
            context_variables.merge(outcome.context_variables);
            if let Some(next_agent) = outcome.agent {
                debug!(from = active_agent.name(), to = next_agent.name(), "handoff");
                active_agent = next_agent;
            }
        }

        Ok(RunResponse {
            messages: history.split_off(init_len),
            agent: Some(active_agent),
            context_variables,
        })
    }
}

/// Compose the normalized request for one turn: resolved instructions
/// prepended as the system message, tool descriptors, effective model and
/// tool-choice policy.
pub(crate) fn build_chat_request(
    agent: &Agent,
    history: &[Message],
    context_variables: &ContextVariables,
    model_override: Option<&str>,
) -> ChatRequest {
    let instructions = agent.instructions().resolve(context_variables);

    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(Message::system(instructions));
    messages.extend_from_slice(history);

    let tools = agent
        .tools()
        .iter()
        .map(|t| schema::describe(t.as_ref()))
        .collect();

    ChatRequest {
        model: model_override.unwrap_or_else(|| agent.model()).to_string(),
        messages,
        tools,
        tool_choice: agent.tool_choice().cloned(),
        parallel_tool_calls: agent.parallel_tool_calls(),
    }
}

/// Result of executing one batch of tool calls.
pub(crate) struct ToolBatchOutcome {
    pub messages: Vec<Message>,
    pub agent: Option<Agent>,
    pub context_variables: ContextVariables,
}

/// Execute a batch of tool calls in presented order.
///
/// Local failures (unknown tool, malformed arguments, tool-body errors) are
/// folded into history as error-content tool results; the first handoff wins
/// and skips the remaining calls in the batch. The only fatal outcome is a
/// tool output that cannot be coerced to a string.
pub(crate) async fn execute_tool_calls(
    calls: &[ToolCall],
    agent: &Agent,
    context_variables: &ContextVariables,
) -> Result<ToolBatchOutcome> {
    let mut outcome = ToolBatchOutcome {
        messages: Vec::with_capacity(calls.len()),
        agent: None,
        context_variables: ContextVariables::new(),
    };

    for call in calls {
        let Some(tool) = agent.tool(&call.name) else {
            warn!(tool = %call.name, "tool not found");
            outcome.messages.push(Message::tool_result(
                call.id.clone(),
                call.name.clone(),
                format!("Error: tool '{}' not found.", call.name),
            ));
            continue;
        };

        let args = match ToolArguments::from_raw(&call.arguments) {
            Ok(args) => args,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "invalid tool arguments");
                outcome.messages.push(Message::tool_result(
                    call.id.clone(),
                    call.name.clone(),
                    format!("Error: invalid arguments for '{}': {e}", call.name),
                ));
                continue;
            }
        };

        debug!(tool = %call.name, args = %call.arguments, "executing tool call");

        let ctx = ToolContext {
            tool_call_id: Some(call.id.clone()),
            tool_name: Some(call.name.clone()),
            context_variables: tool
                .wants_context()
                .then(|| context_variables.clone()),
        };

        match tool.execute(&args, &ctx).await {
            Ok(ret) => {
                let output = normalize_tool_return(ret)?;
                outcome.messages.push(Message::tool_result(
                    call.id.clone(),
                    call.name.clone(),
                    output.value,
                ));
                outcome.context_variables.merge(output.context_variables);
                if output.agent.is_some() {
                    // First handoff wins; the rest of the batch is skipped.
                    outcome.agent = output.agent;
                    return Ok(outcome);
                }
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool execution failed");
                outcome.messages.push(Message::tool_result(
                    call.id.clone(),
                    call.name.clone(),
                    format!("Error: {e}"),
                ));
            }
        }
    }

    Ok(outcome)
}

/// Apply the deterministic coercion rule to a tool's return value.
pub(crate) fn normalize_tool_return(ret: ToolReturn) -> Result<ToolOutput> {
    match ret {
        ToolReturn::Text(value) => Ok(ToolOutput::new(value)),
        ToolReturn::Json(value) => serde_json::to_string(&value)
            .map(ToolOutput::new)
            .map_err(|e| MurmurError::ResultCoercion(e.to_string())),
        ToolReturn::Handoff(agent) => {
            let value = serde_json::json!({"assistant": agent.name()}).to_string();
            Ok(ToolOutput::new(value).with_agent(agent))
        }
        ToolReturn::Output(output) => Ok(output),
    }
}
