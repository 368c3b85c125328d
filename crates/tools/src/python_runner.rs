//! Python runner tool: execute a snippet in a child interpreter.
//!
//! The snippet runs as `<interpreter> -c <code>` with a wall-clock timeout.
//! A non-zero exit is reported in the result; failing to spawn the
//! interpreter or running out of time is a tool error.

use async_trait::async_trait;
use officechat_core::error::ToolError;
use officechat_core::tool::{Tool, ToolParameters};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

pub struct PythonRunnerTool {
    interpreter: String,
    timeout: Duration,
}

impl PythonRunnerTool {
    pub fn new(interpreter: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl Default for PythonRunnerTool {
    fn default() -> Self {
        Self::new("python3", 30)
    }
}

#[async_trait]
impl Tool for PythonRunnerTool {
    fn name(&self) -> &str {
        "python_runner"
    }

    fn description(&self) -> &str {
        "Execute Python code and return the output."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "The Python code to execute"
                }
            },
            "required": ["code"]
        })
    }

    async fn run(&self, parameters: &ToolParameters) -> Result<serde_json::Value, ToolError> {
        let code = parameters
            .get("code")
            .and_then(|c| c.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'code' argument".into()))?;

        debug!(interpreter = %self.interpreter, bytes = code.len(), "Running python snippet");

        let child = Command::new(&self.interpreter)
            .arg("-c")
            .arg(code)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ToolError::ExecutionFailed {
                    tool_name: self.name().into(),
                    reason: format!("cannot start {}: {e}", self.interpreter),
                });
            }
            Err(_) => {
                return Err(ToolError::Timeout {
                    tool_name: self.name().into(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let success = output.status.success();
        if !success {
            warn!(exit_code = output.status.code().unwrap_or(-1), "Python snippet failed");
        }

        Ok(serde_json::json!({
            "stdout": String::from_utf8_lossy(&output.stdout),
            "stderr": String::from_utf8_lossy(&output.stderr),
            "success": success,
        }))
    }
}
