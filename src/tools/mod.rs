//! Tool system for function calling.

pub mod arguments;
pub mod schema;
pub mod tool;
pub mod types;

pub use arguments::ToolArguments;
pub use schema::{describe, CONTEXT_VARIABLES};
pub use tool::{FunctionTool, Tool, ToolContext};
pub use types::{ParameterBuilder, ToolParameters};
