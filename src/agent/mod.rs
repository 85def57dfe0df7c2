//! Agent value type and instructions.

mod agent;

pub use agent::{Agent, Instructions, ToolChoice};
