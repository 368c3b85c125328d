//! Tool-call extraction from free-form model output.
//!
//! Exactly two attempts are made, in order:
//! 1. the whole output as an invocation object;
//! 2. the span from the first `{` to the last `}` (inclusive).
//!
//! Anything else is plain text.

use officechat_core::tool::ToolInvocation;
use tracing::debug;

pub fn extract_tool_call(output: &str) -> Option<ToolInvocation> {
    if let Ok(invocation) = serde_json::from_str::<ToolInvocation>(output) {
        return Some(invocation);
    }

    let start = output.find('{')?;
    let end = output.rfind('}')?;
    if start > end {
        return None;
    }

    match serde_json::from_str::<ToolInvocation>(&output[start..=end]) {
        Ok(invocation) => Some(invocation),
        Err(e) => {
            debug!(error = %e, "No tool call in braced span");
            None
        }
    }
}
