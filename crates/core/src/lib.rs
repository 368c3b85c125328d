//! # officechat core
//!
//! Domain types, traits, and error definitions for the officechat
//! multi-agent office. This crate has no framework dependencies: it defines
//! the model every other crate implements against.
//!
//! The two ports live here:
//! - [`Provider`]: the language model backend
//! - [`Tool`]: a named capability an agent can invoke

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{BusError, Error, ProviderError, Result, ToolError};
pub use message::{ChatMessage, Role, Transcript, TranscriptEntry, preview};
pub use provider::{FragmentReceiver, Provider, ProviderRequest};
pub use tool::{Tool, ToolDefinition, ToolInvocation, ToolOutcome, ToolParameters, ToolSet};
