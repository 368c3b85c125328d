//! Chat message and transcript domain types.
//!
//! A [`ChatMessage`] is what travels over the office chat; a [`Transcript`]
//! is the private, role-tagged history one agent sends to its model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single message on the office chat.
///
/// Owned by the bus once committed. Subscribers only ever receive clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message ID (unused by the protocol, kept for extension)
    pub id: String,

    /// Participant identifier of the author
    pub sender: String,

    /// The text content (empty while a streamed message is in flight)
    pub content: String,

    /// Creation instant
    pub timestamp: DateTime<Utc>,

    /// True only between the first publish of a streamed message and its completion
    #[serde(default)]
    pub streaming: bool,
}

impl ChatMessage {
    /// Create a complete message.
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender: sender.into(),
            content: content.into(),
            timestamp: Utc::now(),
            streaming: false,
        }
    }

    /// Create the empty placeholder committed at the start of a streamed message.
    pub fn placeholder(sender: impl Into<String>) -> Self {
        Self {
            streaming: true,
            ..Self::new(sender, String::new())
        }
    }
}

/// The role of an entry in an agent transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (persona, rules)
    System,
    /// Anything the agent reads: chat messages and tool descriptions
    User,
    /// The model's own completions
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One role-tagged transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
}

impl TranscriptEntry {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only, agent-private conversation history.
///
/// There is no eviction: the transcript grows for the lifetime of the agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Start a transcript with a system prompt.
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            entries: vec![TranscriptEntry::system(prompt)],
        }
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }
}

/// Shorten text for log lines: first 50 characters, then `...`.
pub fn preview(text: &str) -> String {
    const LIMIT: usize = 50;
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
