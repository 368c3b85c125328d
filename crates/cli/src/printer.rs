//! Terminal subscribers for the office chat.

use async_trait::async_trait;
use futures::StreamExt;
use officechat_agent::{AgentStreamEvent, DIRECT_SENDER, NO_RESPONSE_TEXT};
use officechat_core::Error;
use officechat_core::message::ChatMessage;
use officechat_office::{FragmentStream, StreamSubscriber, Subscriber};
use std::io::Write;
use tokio::sync::mpsc;
use tracing::debug;

/// Prints every whole message except the user's own.
pub struct ChatPrinter;

#[async_trait]
impl Subscriber for ChatPrinter {
    fn name(&self) -> &str {
        "chat_printer"
    }

    async fn on_message(&self, message: &ChatMessage) -> officechat_core::Result<()> {
        if message.sender == DIRECT_SENDER {
            return Ok(());
        }
        println!("\n{}: {}", message.sender, message.content);
        Ok(())
    }
}

/// Prints streamed messages fragment by fragment.
pub struct StreamPrinter;

#[async_trait]
impl StreamSubscriber for StreamPrinter {
    fn name(&self) -> &str {
        "stream_printer"
    }

    async fn on_stream(
        &self,
        message: &ChatMessage,
        mut fragments: FragmentStream,
    ) -> officechat_core::Result<()> {
        let mut out = std::io::stdout();
        emit(&mut out, &format!("\n{}: ", message.sender))?;
        while let Some(fragment) = fragments.next().await {
            emit(&mut out, &fragment)?;
        }
        emit(&mut out, "\n")
    }
}

/// Write and flush, so a live fragment shows up at once.
fn emit(out: &mut impl Write, text: &str) -> officechat_core::Result<()> {
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|e| Error::Internal(format!("terminal write failed: {e}")))
}

/// Render a direct answer as it streams, without touching the bus.
///
/// Returns the failure message when the pass ended in an error.
pub async fn print_answer(
    name: &str,
    mut events: mpsc::Receiver<AgentStreamEvent>,
    out: &mut impl Write,
) -> std::io::Result<Option<String>> {
    write!(out, "{name}: ")?;
    out.flush()?;

    let mut failure = None;
    while let Some(event) = events.recv().await {
        debug!(agent = %name, event = event.event_type(), "Direct answer event");
        let terminal = event.is_terminal();
        match event {
            AgentStreamEvent::Chunk { content } => {
                write!(out, "{content}")?;
                out.flush()?;
            }
            AgentStreamEvent::Done { reply: None } => write!(out, "{NO_RESPONSE_TEXT}")?,
            AgentStreamEvent::Error { message } => failure = Some(message),
            _ => {}
        }
        if terminal {
            break;
        }
    }

    writeln!(out)?;
    Ok(failure)
}
