//! Built-in capabilities for officechat agents.
//!
//! Tools give an agent the ability to act beyond talking:
//! stay silent, search the web, keep notes, and run Python.
//!
//! The broadcast capability (`ask_office`) needs a handle on the bus and
//! lives in the agent crate.

pub mod no_response;
pub mod notepad;
pub mod python_runner;
pub mod web_search;

use officechat_config::{AgentProfile, AppConfig, ToolKind};
use officechat_core::error::ToolError;
use officechat_core::tool::ToolSet;
use std::sync::Arc;
use tracing::{debug, warn};

pub use no_response::{NO_RESPONSE, NoResponseTool};
pub use notepad::{NotepadReadTool, NotepadWriteTool};
pub use python_runner::PythonRunnerTool;
pub use web_search::WebSearchTool;

/// Build the role-specific tools a profile asks for.
///
/// Notes go to `<notes_dir>/<role slug>`. Web search is skipped with a
/// warning when no SerpAPI key is configured.
pub fn role_tools(profile: &AgentProfile, config: &AppConfig) -> Result<ToolSet, ToolError> {
    let mut tools = ToolSet::new();

    for kind in &profile.tools {
        match kind {
            ToolKind::WebSearch => match &config.serpapi_api_key {
                Some(key) => tools.register(Arc::new(WebSearchTool::new(key.clone()))),
                None => {
                    warn!(agent = %profile.name, "SERPAPI_API_KEY not set, web_search disabled");
                }
            },
            ToolKind::Notepad => {
                let dir = config.notes_dir.join(profile.role_slug());
                tools.register(Arc::new(NotepadWriteTool::new(&dir)?));
                tools.register(Arc::new(NotepadReadTool::new(&dir)?));
            }
            ToolKind::PythonRunner => tools.register(Arc::new(PythonRunnerTool::new(
                config.python.interpreter.clone(),
                config.python.timeout_secs,
            ))),
        }
    }

    debug!(agent = %profile.name, tools = ?tools.names(), "Built role tools");
    Ok(tools)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path) -> AppConfig {
        AppConfig {
            notes_dir: dir.to_path_buf(),
            ..AppConfig::default()
        }
    }

    fn profile_with(tools: Vec<ToolKind>) -> AgentProfile {
        AgentProfile {
            name: "Luke".into(),
            role: "Product".into(),
            specialty: None,
            focus: vec![],
            tools,
            system_prompt: None,
            enabled: true,
        }
    }

    #[test]
    fn web_search_requires_key() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = config_in(tmp.path());
        config.serpapi_api_key = None;
        let tools = role_tools(&profile_with(vec![ToolKind::WebSearch]), &config).unwrap();
        assert!(tools.is_empty());

        config.serpapi_api_key = Some("key".into());
        let tools = role_tools(&profile_with(vec![ToolKind::WebSearch]), &config).unwrap();
        assert_eq!(tools.names(), vec!["web_search"]);
    }

    #[test]
    fn notepad_registers_both_tools_under_role_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_in(tmp.path());
        let tools = role_tools(
            &profile_with(vec![ToolKind::Notepad, ToolKind::PythonRunner]),
            &config,
        )
        .unwrap();
        assert_eq!(tools.names(), vec!["notepad_write", "notepad_read", "python_runner"]);
        assert!(tmp.path().join("product").is_dir());
    }
}
