//! Single-producer, multi-consumer fragment tee.
//!
//! The bus reads a fragment source exactly once and re-emits every fragment,
//! in order, to each reader. Readers get unbounded channels so a slow or
//! stalled reader never holds up the others or the final aggregation.

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// The live, single-pass fragment sequence handed to a streaming subscriber.
pub type FragmentStream = UnboundedReceiverStream<String>;

pub(crate) struct FragmentTee {
    outputs: Vec<mpsc::UnboundedSender<String>>,
}

impl FragmentTee {
    /// Create a tee with `readers` outputs.
    pub(crate) fn new(readers: usize) -> (Self, Vec<FragmentStream>) {
        let (outputs, streams): (Vec<_>, Vec<_>) = (0..readers)
            .map(|_| {
                let (tx, rx) = mpsc::unbounded_channel();
                (tx, UnboundedReceiverStream::new(rx))
            })
            .unzip();
        (Self { outputs }, streams)
    }

    /// Drain `source` once, copying each fragment to every reader.
    ///
    /// Returns the fragments in emission order. Readers see end-of-stream
    /// when this returns, since the tee is consumed.
    pub(crate) async fn pump<S>(self, source: S) -> Vec<String>
    where
        S: Stream<Item = String>,
    {
        let mut source = std::pin::pin!(source);
        let mut collected = Vec::new();

        while let Some(fragment) = source.next().await {
            for output in &self.outputs {
                // A reader that hung up just stops receiving.
                let _ = output.send(fragment.clone());
            }
            collected.push(fragment);
        }
        collected
    }
}
