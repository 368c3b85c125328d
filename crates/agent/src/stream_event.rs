//! Agent-level streaming events.
//!
//! `AgentStreamEvent` wraps model fragments and tool activity into the
//! events a streaming caller (the interactive chat, a direct ask) renders.

use serde::{Deserialize, Serialize};

/// Events emitted by the agent during a streaming pass.
///
/// - `chunk`: text to show immediately (model fragment or tool summary)
/// - `tool_call`: the agent is invoking a tool
/// - `tool_result`: tool execution completed
/// - `done`: the pass finished; `reply` is what the agent says, if anything
/// - `error`: the pass failed; nothing follows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    /// Text for the immediate observer.
    Chunk { content: String },

    /// The agent is calling a tool.
    ToolCall {
        name: String,
        input: serde_json::Value,
    },

    /// Tool execution completed.
    ToolResult {
        name: String,
        output: serde_json::Value,
    },

    /// The pass is complete.
    Done { reply: Option<String> },

    /// An error ended the pass.
    Error { message: String },
}

impl AgentStreamEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    /// True for `done` and `error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_chunk() {
        let event = AgentStreamEvent::Chunk {
            content: "Hello".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"chunk""#));
        assert!(json.contains(r#""content":"Hello""#));
    }

    #[test]
    fn event_serialization_done_without_reply() {
        let json = serde_json::to_string(&AgentStreamEvent::Done { reply: None }).unwrap();
        assert_eq!(json, r#"{"type":"done","reply":null}"#);
    }

    #[test]
    fn event_deserialization() {
        let json = r#"{"type":"tool_call","name":"web_search","input":{"query":"crm"}}"#;
        let event: AgentStreamEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type(), "tool_call");
        match event {
            AgentStreamEvent::ToolCall { name, input } => {
                assert_eq!(name, "web_search");
                assert_eq!(input["query"], "crm");
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn terminal_events() {
        assert!(AgentStreamEvent::Done { reply: None }.is_terminal());
        assert!(AgentStreamEvent::Error { message: "x".into() }.is_terminal());
        assert!(!AgentStreamEvent::Chunk { content: "x".into() }.is_terminal());
    }
}
