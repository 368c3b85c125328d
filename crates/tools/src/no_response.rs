//! No-response tool: the deliberate way for an agent to stay silent.

use async_trait::async_trait;
use officechat_core::error::ToolError;
use officechat_core::tool::{Tool, ToolParameters};

/// Name the response protocol checks to suppress a reply.
pub const NO_RESPONSE: &str = "no_response";

pub struct NoResponseTool;

#[async_trait]
impl Tool for NoResponseTool {
    fn name(&self) -> &str {
        NO_RESPONSE
    }

    fn description(&self) -> &str {
        "Use this tool when you decide not to respond to the current office chat message."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "reason": {
                    "type": "string",
                    "description": "Optional reason for not responding"
                }
            },
            "required": []
        })
    }

    async fn run(&self, parameters: &ToolParameters) -> Result<serde_json::Value, ToolError> {
        let text = match parameters.get("reason").and_then(|r| r.as_str()) {
            Some(reason) if !reason.is_empty() => format!("No response given: {reason}"),
            _ => "No response given".to_string(),
        };
        Ok(serde_json::Value::String(text))
    }
}
