//! Tool return values and run results.

use crate::agent::Agent;
use crate::types::context::ContextVariables;
use crate::types::message::Message;

/// What a tool body hands back to the orchestrator.
///
/// Anything convertible into one of these variants can be returned directly
/// from a tool closure via the `From` impls below.
#[derive(Debug, Clone)]
pub enum ToolReturn {
    /// Plain text, used verbatim as the tool-result content.
    Text(String),
    /// Arbitrary JSON value, serialized to a string by the orchestrator.
    Json(serde_json::Value),
    /// Hand control off to another agent.
    Handoff(Agent),
    /// Fully specified output (value + optional handoff + context updates).
    Output(ToolOutput),
}

impl From<String> for ToolReturn {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ToolReturn {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<serde_json::Value> for ToolReturn {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<Agent> for ToolReturn {
    fn from(agent: Agent) -> Self {
        Self::Handoff(agent)
    }
}

impl From<ToolOutput> for ToolReturn {
    fn from(output: ToolOutput) -> Self {
        Self::Output(output)
    }
}

/// Normalized tool output: the result content plus optional side effects.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Content of the tool-result message.
    pub value: String,
    /// Replacement active agent (handoff), if any.
    pub agent: Option<Agent>,
    /// Context-variable updates, merged last-writer-wins.
    pub context_variables: ContextVariables,
}

impl ToolOutput {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn with_context_variables(mut self, context_variables: ContextVariables) -> Self {
        self.context_variables = context_variables;
        self
    }
}

/// Outcome of a run: the messages produced during it (caller-supplied input
/// excluded), the final active agent, and the final context snapshot.
#[derive(Debug, Clone, Default)]
pub struct RunResponse {
    pub messages: Vec<Message>,
    pub agent: Option<Agent>,
    pub context_variables: ContextVariables,
}
