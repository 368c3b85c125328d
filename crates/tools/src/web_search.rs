//! Web search tool: Google results through SerpAPI.

use async_trait::async_trait;
use officechat_core::error::ToolError;
use officechat_core::tool::{Tool, ToolParameters};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const SERPAPI_URL: &str = "https://serpapi.com/search";

pub struct WebSearchTool {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, SERPAPI_URL)
    }

    /// Point the tool at a different SerpAPI-compatible endpoint.
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            client,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct SearchResult {
    title: String,
    link: String,
    snippet: String,
}

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

fn top_results(response: SerpResponse, count: usize) -> Vec<SearchResult> {
    response
        .organic_results
        .into_iter()
        .take(count)
        .map(|r| SearchResult {
            title: r.title,
            link: r.link,
            snippet: r.snippet,
        })
        .collect()
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web using Google Search. Returns search results for the given query."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to look up on Google"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of search results to return (default: 5)"
                }
            },
            "required": ["query"]
        })
    }

    async fn run(&self, parameters: &ToolParameters) -> Result<serde_json::Value, ToolError> {
        let query = parameters
            .get("query")
            .and_then(|q| q.as_str())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;
        let num_results = parameters
            .get("num_results")
            .and_then(|n| n.as_u64())
            .unwrap_or(5) as usize;

        debug!(query = %query, num_results, "Searching the web");

        let num = num_results.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
                ("engine", "google"),
            ])
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Search request rejected");
            return Ok(serde_json::json!({ "error": format!("Error during search: {body}") }));
        }

        let parsed: SerpResponse =
            response.json().await.map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: format!("Unreadable search response: {e}"),
            })?;

        serde_json::to_value(top_results(parsed, num_results)).map_err(|e| {
            ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            }
        })
    }
}
