//! Process wiring: one provider, one office chat, every enabled agent.

use officechat_agent::Agent;
use officechat_config::{AppConfig, ModelMatch, match_model};
use officechat_core::provider::Provider;
use officechat_office::OfficeChat;
use officechat_providers::OllamaProvider;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a chat session needs.
pub struct Office {
    pub chat: Arc<OfficeChat>,
    pub agents: Vec<Arc<Agent>>,
    pub provider: Arc<dyn Provider>,
}

impl Office {
    /// Look an agent up by name, ignoring case.
    pub fn find(&self, name: &str) -> Option<&Arc<Agent>> {
        self.agents
            .iter()
            .find(|agent| agent.name().eq_ignore_ascii_case(name))
    }

    /// Agent names, in roster order.
    pub fn names(&self) -> Vec<&str> {
        self.agents.iter().map(|agent| agent.name()).collect()
    }
}

/// The Ollama backend for `config`.
pub fn ollama(config: &AppConfig) -> Arc<dyn Provider> {
    Arc::new(OllamaProvider::new(config.ollama_host.clone()))
}

/// Build every enabled agent and subscribe it, in roster order.
pub async fn build_office(
    config: &AppConfig,
    model: &str,
    provider: Arc<dyn Provider>,
) -> Result<Office, Box<dyn std::error::Error>> {
    match match_model(model) {
        ModelMatch::Exact => {}
        ModelMatch::BaseName(base) => {
            info!(model = %model, base = %base, "Model tag not in catalog, base name is")
        }
        ModelMatch::Unknown => warn!(model = %model, "Model not in catalog, using it as given"),
    }

    let chat = Arc::new(OfficeChat::new());
    let mut agents = Vec::new();
    for profile in config.active_agents() {
        let agent = Agent::from_profile(profile, config, model, provider.clone(), &chat)
            .map_err(|e| format!("Failed to build agent {}: {e}", profile.name))?;
        agents.push(Arc::new(agent).attach().await?);
    }

    if agents.is_empty() {
        return Err("No agents could be initialized".into());
    }

    info!(agents = agents.len(), model = %model, "Office ready");
    Ok(Office {
        chat,
        agents,
        provider,
    })
}
