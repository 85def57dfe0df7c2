//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::types::ToolParameters;
use crate::error::Result;
use crate::types::{ContextVariables, ToolReturn};

/// Context available during tool execution.
///
/// `context_variables` is `Some` only for tools that declared the dependency
/// via [`Tool::wants_context`]; every other tool sees `None`.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub tool_call_id: Option<String>,
    pub tool_name: Option<String>,
    pub context_variables: Option<ContextVariables>,
}

/// Core tool trait — implement to create custom tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description, empty if absent.
    fn description(&self) -> &str {
        ""
    }

    /// JSON Schema parameters.
    fn parameters(&self) -> &ToolParameters;

    /// Whether the orchestrator should inject the run's context variables.
    ///
    /// Tools never receive them unless they explicitly ask.
    fn wants_context(&self) -> bool {
        false
    }

    /// Execute the tool with decoded arguments.
    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> Result<ToolReturn>;
}

type ToolHandler = dyn Fn(ToolArguments, ToolContext) -> Pin<Box<dyn Future<Output = Result<ToolReturn>> + Send>>
    + Send
    + Sync;

/// Closure-based tool for quick tool creation.
pub struct FunctionTool {
    name: String,
    description: String,
    parameters: ToolParameters,
    wants_context: bool,
    handler: Arc<ToolHandler>,
}

impl FunctionTool {
    /// Create a tool from a closure.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolReturn>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            wants_context: false,
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }

    /// Declare the context-variable dependency: the orchestrator will inject
    /// the live context variables into [`ToolContext::context_variables`].
    pub fn with_context(mut self) -> Self {
        self.wants_context = true;
        self
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    fn wants_context(&self) -> bool {
        self.wants_context
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> Result<ToolReturn> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("wants_context", &self.wants_context)
            .finish()
    }
}
