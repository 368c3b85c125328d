//! Notepad tools: per-agent scratch files in a flat notes directory.
//!
//! The directory is a flat namespace: every filename is reduced to its final
//! path component before use, so `../../etc/passwd` becomes `passwd`.

use async_trait::async_trait;
use officechat_core::error::ToolError;
use officechat_core::tool::{Tool, ToolParameters};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reduce a requested filename to a bare name inside the notes directory.
pub fn sanitize_filename(tool_name: &str, requested: &str) -> Result<String, ToolError> {
    let name = Path::new(requested)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string();

    if name.is_empty() || name == "." || name == ".." {
        return Err(ToolError::InvalidArguments(format!(
            "{tool_name}: '{requested}' is not a usable file name"
        )));
    }
    Ok(name)
}

fn string_arg<'a>(parameters: &'a ToolParameters, key: &str) -> Result<&'a str, ToolError> {
    parameters
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

/// Classify a filesystem failure; permission problems get their own variant.
fn io_failure(tool_name: &str, reason: String, e: &std::io::Error) -> ToolError {
    let tool_name = tool_name.to_string();
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        ToolError::PermissionDenied { tool_name, reason }
    } else {
        ToolError::ExecutionFailed { tool_name, reason }
    }
}

fn ensure_dir(tool_name: &str, dir: &Path) -> Result<(), ToolError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| io_failure(tool_name, format!("cannot create {}: {e}", dir.display()), &e))
}

pub struct NotepadWriteTool {
    notes_dir: PathBuf,
}

impl NotepadWriteTool {
    /// Create the tool, making sure `notes_dir` exists.
    pub fn new(notes_dir: impl Into<PathBuf>) -> Result<Self, ToolError> {
        let notes_dir = notes_dir.into();
        ensure_dir("notepad_write", &notes_dir)?;
        Ok(Self { notes_dir })
    }

    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }
}

#[async_trait]
impl Tool for NotepadWriteTool {
    fn name(&self) -> &str {
        "notepad_write"
    }

    fn description(&self) -> &str {
        "Write content to a file in the notes directory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "filename": {
                    "type": "string",
                    "description": "Name of the file to write to"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write to the file"
                }
            },
            "required": ["filename", "content"]
        })
    }

    async fn run(&self, parameters: &ToolParameters) -> Result<serde_json::Value, ToolError> {
        let filename = sanitize_filename(self.name(), string_arg(parameters, "filename")?)?;
        let content = string_arg(parameters, "content")?;
        let path = self.notes_dir.join(&filename);

        debug!(path = %path.display(), bytes = content.len(), "Writing note");

        tokio::fs::write(&path, content)
            .await
            .map_err(|e| io_failure(self.name(), format!("Failed to write {filename}: {e}"), &e))?;

        Ok(serde_json::Value::String(format!(
            "Content written to {filename} successfully"
        )))
    }
}

pub struct NotepadReadTool {
    notes_dir: PathBuf,
}

impl NotepadReadTool {
    pub fn new(notes_dir: impl Into<PathBuf>) -> Result<Self, ToolError> {
        let notes_dir = notes_dir.into();
        ensure_dir("notepad_read", &notes_dir)?;
        Ok(Self { notes_dir })
    }
}

#[async_trait]
impl Tool for NotepadReadTool {
    fn name(&self) -> &str {
        "notepad_read"
    }

    fn description(&self) -> &str {
        "Read content from a file in the notes directory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "filename": {
                    "type": "string",
                    "description": "Name of the file to read from"
                }
            },
            "required": ["filename"]
        })
    }

    async fn run(&self, parameters: &ToolParameters) -> Result<serde_json::Value, ToolError> {
        let filename = sanitize_filename(self.name(), string_arg(parameters, "filename")?)?;
        let path = self.notes_dir.join(&filename);

        // A missing or unreadable note is reported in the result, not raised.
        let result = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::json!({
                "content": content,
                "success": true,
                "error": null,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => serde_json::json!({
                "content": "",
                "success": false,
                "error": format!("File {filename} not found"),
            }),
            Err(e) => serde_json::json!({
                "content": "",
                "success": false,
                "error": e.to_string(),
            }),
        };
        Ok(result)
    }
}
