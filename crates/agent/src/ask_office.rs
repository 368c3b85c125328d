//! The broadcast capability: post a message to the whole office.

use async_trait::async_trait;
use officechat_core::error::{BusError, ToolError};
use officechat_core::tool::{Tool, ToolParameters};
use officechat_office::OfficeChat;
use std::sync::Weak;

/// Name the response protocol checks to avoid posting twice.
pub const ASK_OFFICE: &str = "ask_office";

/// Posts under the owning agent's name.
///
/// Holds a weak handle: the bus owns its subscribers, not the other way round.
pub struct AskOfficeTool {
    office: Weak<OfficeChat>,
    sender: String,
}

impl AskOfficeTool {
    pub fn new(office: Weak<OfficeChat>, sender: impl Into<String>) -> Self {
        Self {
            office,
            sender: sender.into(),
        }
    }
}

#[async_trait]
impl Tool for AskOfficeTool {
    fn name(&self) -> &str {
        ASK_OFFICE
    }

    fn description(&self) -> &str {
        "Post a message to the office global chat for other agents to see and potentially respond to."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The message to post to the office chat"
                }
            },
            "required": ["message"]
        })
    }

    async fn run(&self, parameters: &ToolParameters) -> Result<serde_json::Value, ToolError> {
        let message = parameters
            .get("message")
            .and_then(|m| m.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'message' argument".into()))?;

        let office = self.office.upgrade().ok_or(BusError::Closed)?;
        office.post(message, self.sender.as_str()).await?;

        Ok(serde_json::Value::String(format!(
            "Message posted to office chat: {message}"
        )))
    }
}
