//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are what give an agent the ability to act: stay silent, broadcast
//! to the office, search the web, keep notes, run code.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::ToolError;

/// Named parameters passed to a tool.
pub type ToolParameters = serde_json::Map<String, serde_json::Value>;

/// A tool description rendered into the agent prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A tool call parsed out of model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Name of the tool to execute
    pub tool: String,

    /// Arguments by name
    #[serde(default)]
    pub parameters: ToolParameters,

    /// The model's stated reasoning; informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<serde_json::Value>,
}

/// The successful result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// The tool that produced this result
    pub tool_name: String,

    /// Tool-specific structured result
    pub result: serde_json::Value,
}

/// The core Tool trait.
///
/// Implementors provide `run`; callers use `execute`, which wraps the result
/// with the tool name and logs failures before returning them unchanged.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "no_response", "notepad_read").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Perform the tool's work.
    async fn run(&self, parameters: &ToolParameters)
    -> std::result::Result<serde_json::Value, ToolError>;

    /// Execute the tool and wrap its result as a [`ToolOutcome`].
    async fn execute(
        &self,
        parameters: &ToolParameters,
    ) -> std::result::Result<ToolOutcome, ToolError> {
        info!(tool = %self.name(), params = %serde_json::Value::Object(parameters.clone()), "Running tool");
        match self.run(parameters).await {
            Ok(result) => {
                debug!(tool = %self.name(), "Tool completed successfully");
                Ok(ToolOutcome {
                    tool_name: self.name().to_string(),
                    result,
                })
            }
            Err(e) => {
                error!(tool = %self.name(), error = %e, "Error executing tool");
                Err(e)
            }
        }
    }

    /// Convert this tool into a ToolDefinition for the prompt.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The ordered set of tools available to one agent.
///
/// Built once when the agent is created; the agent only ever reads it.
/// Registration order is the order tools are described to the model.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Builder-style registration.
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// All tool definitions, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Execute a parsed invocation.
    pub async fn execute(
        &self,
        invocation: &ToolInvocation,
    ) -> std::result::Result<ToolOutcome, ToolError> {
        let tool = self
            .get(&invocation.tool)
            .ok_or_else(|| ToolError::NotFound(invocation.tool.clone()))?;
        tool.execute(&invocation.parameters).await
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet").field("tools", &self.names()).finish()
    }
}
