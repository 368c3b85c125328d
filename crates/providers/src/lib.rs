//! Language model backends for officechat.
//!
//! All backends implement the `officechat_core::Provider` trait.

pub mod ollama;

pub use ollama::OllamaProvider;
