//! Shared test doubles for the response protocol.

use async_trait::async_trait;
use officechat_core::error::{ProviderError, ToolError};
use officechat_core::provider::{FragmentReceiver, Provider, ProviderRequest};
use officechat_core::tool::{Tool, ToolParameters};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted model turn.
pub enum Turn {
    Text(String),
    Fail(ProviderError),
    /// Streams the text, then breaks.
    Broken(String),
}

/// A provider that plays back scripted turns in order.
///
/// Streaming splits each text into four-character fragments.
/// Panics if called more often than scripted.
pub struct ScriptedProvider {
    turns: Mutex<VecDeque<Turn>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Turn::Text(t.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_turn(&self, request: ProviderRequest) -> Turn {
        let mut requests = self.requests.lock().unwrap();
        let turn = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no turn left for call #{}", requests.len()));
        requests.push(request);
        turn
    }
}

pub fn fragments_of(text: &str) -> Vec<String> {
    text.chars()
        .collect::<Vec<_>>()
        .chunks(4)
        .map(|c| c.iter().collect())
        .collect()
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<String, ProviderError> {
        match self.next_turn(request) {
            Turn::Text(text) | Turn::Broken(text) => Ok(text),
            Turn::Fail(e) => Err(e),
        }
    }

    async fn stream(&self, request: ProviderRequest) -> Result<FragmentReceiver, ProviderError> {
        let (text, broken) = match self.next_turn(request) {
            Turn::Text(text) => (text, false),
            Turn::Broken(text) => (text, true),
            Turn::Fail(e) => return Err(e),
        };

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        tokio::spawn(async move {
            for fragment in fragments_of(&text) {
                if tx.send(Ok(fragment)).await.is_err() {
                    return;
                }
            }
            if broken {
                let _ = tx
                    .send(Err(ProviderError::StreamInterrupted("connection reset".into())))
                    .await;
            }
        });
        Ok(rx)
    }
}

/// Returns a fixed result.
pub struct LookupTool;

#[async_trait]
impl Tool for LookupTool {
    fn name(&self) -> &str {
        "lookup"
    }
    fn description(&self) -> &str {
        "Look up open deals"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {"region": {"type": "string"}}})
    }
    async fn run(&self, parameters: &ToolParameters) -> Result<serde_json::Value, ToolError> {
        let region = parameters.get("region").and_then(|r| r.as_str()).unwrap_or("all");
        Ok(serde_json::json!({"region": region, "deals": 3}))
    }
}

/// Always fails.
pub struct BrokenTool;

#[async_trait]
impl Tool for BrokenTool {
    fn name(&self) -> &str {
        "crm_lookup"
    }
    fn description(&self) -> &str {
        "Query the CRM"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }
    async fn run(&self, _parameters: &ToolParameters) -> Result<serde_json::Value, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: "crm_lookup".into(),
            reason: "CRM is down".into(),
        })
    }
}
