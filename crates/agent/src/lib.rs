//! The per-agent response protocol.
//!
//! An [`Agent`] owns a private transcript and an immutable tool set. For
//! every office chat message it did not write, it asks its model once and
//! then stays silent, runs one tool, or replies:
//!
//! 1. **Receive** a message from the bus (or a direct question)
//! 2. **Describe** its tools and the required JSON response shape
//! 3. **Complete** the transcript with the model
//! 4. **Extract** at most one tool call (whole output, then first `{` to last `}`)
//! 5. **Reply** with the tool summary or the raw output, unless silent

pub mod ask_office;
pub mod parse;
pub mod prompt;
pub mod protocol;
pub mod stream_event;

#[cfg(test)]
mod test_helpers;

pub use ask_office::{ASK_OFFICE, AskOfficeTool};
pub use parse::extract_tool_call;
pub use protocol::{Agent, DIRECT_SENDER, ModelSettings, NO_RESPONSE_TEXT};
pub use stream_event::AgentStreamEvent;
