//! Tool descriptor derivation.
//!
//! Pure and stateless: deriving a descriptor twice from the same tool yields
//! identical descriptors.

use crate::provider::ToolDefinition;

use super::tool::Tool;

/// Reserved parameter name for the injected context variables.
///
/// The orchestrator owns this dependency; the name is stripped from every
/// emitted schema so the model never sees it.
pub const CONTEXT_VARIABLES: &str = "context_variables";

/// Derive the descriptor a backend consumes for one tool.
pub fn describe(tool: &dyn Tool) -> ToolDefinition {
    let mut schema = tool.parameters().schema.clone();
    strip_context_parameter(&mut schema);
    ToolDefinition {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        parameters: schema,
    }
}

/// Remove the reserved context-variable parameter from a schema, covering
/// hand-written schemas that mention it.
fn strip_context_parameter(schema: &mut serde_json::Value) {
    if let Some(properties) = schema
        .get_mut("properties")
        .and_then(serde_json::Value::as_object_mut)
    {
        properties.remove(CONTEXT_VARIABLES);
    }
    if let Some(required) = schema
        .get_mut("required")
        .and_then(serde_json::Value::as_array_mut)
    {
        required.retain(|name| name.as_str() != Some(CONTEXT_VARIABLES));
    }
}
