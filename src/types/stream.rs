//! Streaming types.

use serde::{Deserialize, Serialize};

use crate::types::message::Role;
use crate::types::outcome::RunResponse;

/// An incremental piece of an assistant message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Agent name, injected by the orchestrator on forwarded deltas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

/// A fragment of a tool call under assembly.
///
/// Fragments are merged by `index`: id and name are filled on first sight,
/// argument strings are concatenated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolCallDelta {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// Item emitted by a streaming run.
///
/// Each turn is delimited by `TurnStart`/`TurnEnd`; the final item of the
/// whole run is `Done` carrying the same response a blocking run returns.
#[derive(Debug, Clone)]
pub enum StreamItem {
    TurnStart,
    Delta(MessageDelta),
    TurnEnd,
    Done(RunResponse),
}
