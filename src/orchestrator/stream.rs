//! Streaming variant: sentinel-delimited turns with incremental assembly.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::debug;

use crate::agent::Agent;
use crate::provider::ChatProvider;
use crate::types::{
    ContextVariables, Message, MessageDelta, RunResponse, StreamItem, ToolCall,
};

use super::runner::{build_chat_request, execute_tool_calls, Orchestrator, RunOptions};

impl Orchestrator {
    /// Run the turn loop, surfacing each turn's chunks as they arrive.
    ///
    /// Every turn is delimited by [`StreamItem::TurnStart`] and
    /// [`StreamItem::TurnEnd`]; after the last turn the stream yields
    /// [`StreamItem::Done`] with the same response [`Orchestrator::run`]
    /// would have returned. Backend failures end the stream with an `Err`.
    pub fn run_stream(
        &self,
        agent: Agent,
        messages: Vec<Message>,
        context_variables: ContextVariables,
        options: RunOptions,
    ) -> BoxStream<'static, crate::error::Result<StreamItem>> {
        let provider = Arc::clone(&self.provider);

        let stream = async_stream::try_stream! {
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
                    "requesting streamed completion"
                );

                let mut chunks = provider.stream(&request).await?;
                let mut draft = MessageDraft::default();

                yield StreamItem::TurnStart;
                while let Some(delta) = chunks.next().await {
                    let mut delta = delta?;
                    delta.sender = Some(active_agent.name().to_string());
                    merge_delta(&mut draft, &delta);
                    yield StreamItem::Delta(delta);
                }
                yield StreamItem::TurnEnd;

                let message = draft.finalize(active_agent.name());
                let calls = message.tool_calls().to_vec();
                history.push(message);

                if calls.is_empty() || !options.execute_tools {
                    debug!("ending turn");
                    break;
                }

                let outcome =
                    execute_tool_calls(&calls, &active_agent, &context_variables).await?;
                history.extend(outcome.messages);
                context_variables.merge(outcome.context_variables);
                if let Some(next_agent) = outcome.agent {
                    debug!(from = active_agent.name(), to = next_agent.name(), "handoff");
                    active_agent = next_agent;
                }
            }

            yield StreamItem::Done(RunResponse {
                messages: history.split_off(init_len),
                agent: Some(active_agent),
                context_variables,
            });
        };

        Box::pin(stream)
    }
}

/// An assistant message under assembly.
#[derive(Debug, Default)]
pub(crate) struct MessageDraft {
    content: String,
    tool_calls: BTreeMap<usize, ToolCallDraft>,
}

#[derive(Debug, Default)]
struct ToolCallDraft {
    id: String,
    name: String,
    arguments: String,
}

/// Merge one chunk into the draft: content is appended; tool-call fragments
/// merge by index, filling id/name on first sight and concatenating
/// argument fragments.
pub(crate) fn merge_delta(draft: &mut MessageDraft, delta: &MessageDelta) {
    if let Some(ref content) = delta.content {
        draft.content.push_str(content);
    }
    if let Some(ref calls) = delta.tool_calls {
        for call in calls {
            let entry = draft.tool_calls.entry(call.index).or_default();
            if entry.id.is_empty() {
                if let Some(ref id) = call.id {
                    entry.id.clone_from(id);
                }
            }
            if entry.name.is_empty() {
                if let Some(ref name) = call.name {
                    entry.name.clone_from(name);
                }
            }
            if let Some(ref fragment) = call.arguments {
                entry.arguments.push_str(fragment);
            }
        }
    }
}

impl MessageDraft {
    /// Finalize into the message the non-streaming path would have recorded.
    pub(crate) fn finalize(self, sender: &str) -> Message {
        let tool_calls: Vec<ToolCall> = self
            .tool_calls
            .into_values()
            .map(|d| ToolCall::new(d.id, d.name, d.arguments))
            .collect();

        let content = if self.content.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(self.content)
        };

        let mut message = Message::assistant_with_tool_calls(content, tool_calls);
        message.sender = Some(sender.to_string());
        message
    }
}
