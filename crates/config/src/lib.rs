//! Configuration loading, validation, and management for officechat.
//!
//! Loads configuration from `~/.officechat/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Ollama models the office knows about.
pub const MODEL_CATALOG: &[&str] = &[
    "deepseek-r1:8b-llama-distill-q8_0",
    "deepseek-coder",
    "deepseek-instruct",
    "llama2",
    "llama3",
    "mistral",
    "mixtral",
    "codellama",
];

/// The root configuration structure.
///
/// Maps directly to `~/.officechat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the Ollama server
    #[serde(default = "default_ollama_host")]
    pub ollama_host: String,

    /// Model every agent uses
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Root directory for notepad files (one subdirectory per department)
    #[serde(default = "default_notes_dir")]
    pub notes_dir: PathBuf,

    /// Default log filter when neither RUST_LOG nor a CLI flag is given
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Message posted by `System` when the chat starts
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    /// Wall-clock bound on one published chain, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_timeout_secs: Option<u64>,

    /// SerpAPI key for the web search tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serpapi_api_key: Option<String>,

    /// Python runner settings
    #[serde(default)]
    pub python: PythonConfig,

    /// The agents that share the office chat
    #[serde(default = "default_roster")]
    pub agents: Vec<AgentProfile>,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "deepseek-r1:8b-llama-distill-q8_0".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_notes_dir() -> PathBuf {
    PathBuf::from("./notes")
}
fn default_log_level() -> String {
    "info".into()
}
fn default_welcome_message() -> String {
    "Welcome to the Agent Office! Ask a question that any of our agents can help with. \
     You don't need to respond to this message. Use the `no_response` tool to avoid \
     responding to this message."
        .into()
}
fn default_true() -> bool {
    true
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("ollama_host", &self.ollama_host)
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("notes_dir", &self.notes_dir)
            .field("log_level", &self.log_level)
            .field("welcome_message", &self.welcome_message)
            .field("publish_timeout_secs", &self.publish_timeout_secs)
            .field("serpapi_api_key", &redact(&self.serpapi_api_key))
            .field("python", &self.python)
            .field("agents", &self.agents)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonConfig {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    #[serde(default = "default_python_timeout")]
    pub timeout_secs: u64,
}

fn default_interpreter() -> String {
    "python3".into()
}
fn default_python_timeout() -> u64 {
    30
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            timeout_secs: default_python_timeout(),
        }
    }
}

/// The role-specific tools a profile can ask for.
///
/// `ask_office` and `no_response` are not listed: every agent gets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    WebSearch,
    Notepad,
    PythonRunner,
}

/// One participant of the office.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Participant identifier on the chat (e.g., "Roger")
    pub name: String,

    /// Department (e.g., "Sales")
    pub role: String,

    /// One-line description of the specialty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,

    /// Topics this agent should answer
    #[serde(default)]
    pub focus: Vec<String>,

    /// Role-specific tools
    #[serde(default)]
    pub tools: Vec<ToolKind>,

    /// Full system prompt override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl AgentProfile {
    /// Lowercase, filesystem-safe department name (used for the notes subdirectory).
    pub fn role_slug(&self) -> String {
        let slug: String = self
            .role
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        let trimmed = slug.trim_matches('_');
        if trimmed.is_empty() { "general".into() } else { trimmed.into() }
    }
}

fn profile(
    name: &str,
    role: &str,
    specialty: &str,
    focus: &[&str],
    tools: &[ToolKind],
    enabled: bool,
) -> AgentProfile {
    AgentProfile {
        name: name.into(),
        role: role.into(),
        specialty: Some(specialty.into()),
        focus: focus.iter().map(|s| s.to_string()).collect(),
        tools: tools.to_vec(),
        system_prompt: None,
        enabled,
    }
}

/// The four departments of the default office.
pub fn default_roster() -> Vec<AgentProfile> {
    use ToolKind::*;
    vec![
        profile(
            "Roger",
            "Sales",
            "a sales specialist. You have expertise in sales strategies, customer relationship management, and business development",
            &[
                "Sales strategies and techniques",
                "Customer acquisition and retention",
                "Sales metrics and KPIs",
                "CRM systems and processes",
                "Pricing strategies",
                "Sales forecasting",
            ],
            &[WebSearch, Notepad],
            true,
        ),
        profile(
            "Peter",
            "Marketing",
            "a marketing specialist. You have expertise in marketing strategies, brand management, digital marketing, and market analysis",
            &[
                "Marketing campaigns and strategies",
                "Brand positioning and management",
                "Digital marketing channels (social media, email, content)",
                "Market research and analysis",
                "Customer segmentation",
                "Marketing metrics and ROI",
                "SEO and SEM",
            ],
            &[WebSearch, Notepad],
            true,
        ),
        profile(
            "Luke",
            "Product",
            "a product specialist. You have expertise in product management, product development, UX/UI design, and market requirements",
            &[
                "Product strategy and roadmapping",
                "Product development lifecycle",
                "User experience and user interface design",
                "Market requirements and competitive analysis",
                "Feature prioritization",
                "Product metrics and KPIs",
                "Agile methodologies",
                "Product launch strategies",
            ],
            &[WebSearch, Notepad, PythonRunner],
            true,
        ),
        profile(
            "Diana",
            "Infrastructure",
            "an infrastructure and DevOps specialist. You have expertise in cloud infrastructure, DevOps practices, system administration, and software deployment",
            &[
                "Cloud platforms (AWS, Azure, GCP)",
                "DevOps practices and tools",
                "CI/CD pipelines",
                "Containerization (Docker, Kubernetes)",
                "Infrastructure as Code (Terraform, CloudFormation)",
                "System monitoring and logging",
                "Security best practices",
                "Networking and VPNs",
                "Database administration",
            ],
            &[WebSearch, Notepad, PythonRunner],
            false,
        ),
    ]
}

/// How a requested model name relates to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelMatch {
    /// The exact name is in the catalog
    Exact,
    /// Only the part before `:` is in the catalog
    BaseName(String),
    /// Not in the catalog; used verbatim anyway
    Unknown,
}

/// Look a model name up in [`MODEL_CATALOG`]. The name itself is never replaced.
pub fn match_model(name: &str) -> ModelMatch {
    if MODEL_CATALOG.contains(&name) {
        return ModelMatch::Exact;
    }
    let base = name.split(':').next().unwrap_or(name);
    if base != name && MODEL_CATALOG.contains(&base) {
        return ModelMatch::BaseName(base.to_string());
    }
    ModelMatch::Unknown
}

impl AppConfig {
    /// Load from a specific path, then apply environment overrides.
    ///
    /// Environment overrides (highest priority):
    /// - `OLLAMA_HOST`
    /// - `DEFAULT_MODEL`
    /// - `SERPAPI_API_KEY`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("OLLAMA_HOST") {
            self.ollama_host = host;
        }
        if let Some(model) = lookup("DEFAULT_MODEL") {
            self.default_model = model;
        }
        if let Some(key) = lookup("SERPAPI_API_KEY") {
            self.serpapi_api_key = Some(key);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".officechat")
    }

    /// Enabled agents, in roster order.
    pub fn active_agents(&self) -> impl Iterator<Item = &AgentProfile> {
        self.agents.iter().filter(|a| a.enabled)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.python.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "python.timeout_secs must be > 0".into(),
            ));
        }

        if self.active_agents().next().is_none() {
            return Err(ConfigError::ValidationError(
                "at least one agent must be enabled".into(),
            ));
        }

        let mut seen = HashSet::new();
        for agent in &self.agents {
            if agent.name.trim().is_empty() {
                return Err(ConfigError::ValidationError("agent name must not be empty".into()));
            }
            if !seen.insert(agent.name.to_lowercase()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate agent name '{}'",
                    agent.name
                )));
            }
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ollama_host: default_ollama_host(),
            default_model: default_model(),
            temperature: default_temperature(),
            notes_dir: default_notes_dir(),
            log_level: default_log_level(),
            welcome_message: default_welcome_message(),
            publish_timeout_secs: None,
            serpapi_api_key: None,
            python: PythonConfig::default(),
            agents: default_roster(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
