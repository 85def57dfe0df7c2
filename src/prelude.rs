//! Convenience re-exports for common use.

pub use crate::agent::{Agent, Instructions, ToolChoice};
pub use crate::config::Config;
pub use crate::error::{MurmurError, Result};
pub use crate::orchestrator::{Orchestrator, RunOptions};
pub use crate::provider::{ChatProvider, ChatRequest, ProviderKind, ToolDefinition};
pub use crate::tools::{
    FunctionTool, ParameterBuilder, Tool, ToolArguments, ToolContext, ToolParameters,
};
pub use crate::types::{
    ContextVariables, Message, MessageDelta, Role, RunResponse, StreamItem, ToolCall,
    ToolCallDelta, ToolOutput, ToolReturn,
};
