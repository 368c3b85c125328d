//! Provider trait: the language model port.
//!
//! A Provider knows how to send a transcript to an LLM and get a completion
//! back, either as one text or as a stream of text fragments whose
//! concatenation equals the complete text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ProviderError;
use crate::message::TranscriptEntry;

/// Receiving half of a streamed completion.
///
/// Finite, ordered and single-pass. A backend failure arrives as an `Err`
/// item and ends the stream.
pub type FragmentReceiver = mpsc::Receiver<std::result::Result<String, ProviderError>>;

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "llama3", "mistral")
    pub model: String,

    /// The full transcript, oldest first
    pub messages: Vec<TranscriptEntry>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.7
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The response protocol calls
/// `complete()` or `stream()` without knowing which backend is in use.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "ollama").
    fn name(&self) -> &str;

    /// Send a request and get the complete text.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<String, ProviderError>;

    /// Send a request and get a stream of text fragments.
    ///
    /// Default implementation calls `complete()` and yields the result as a
    /// single fragment.
    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<FragmentReceiver, ProviderError> {
        let text = self.complete(request).await?;
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.send(Ok(text)).await;
        Ok(rx)
    }

    /// List models available on the backend.
    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }

    /// Health check: can we reach the backend?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
