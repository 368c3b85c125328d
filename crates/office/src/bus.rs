//! The office chat: an append-only log with two kinds of subscriber.
//!
//! Whole-message subscribers get every committed message from [`OfficeChat::post`].
//! Streaming subscribers get the placeholder of a [`OfficeChat::post_streaming`]
//! message plus a live copy of its fragments.
//!
//! Fan-out is concurrent within one post and awaited before the post returns.
//! Publications from outside are serialized: a second publisher waits until
//! the first post, including every reply it triggers, has finished. A
//! subscriber may still post from inside its own handler (agents answering
//! each other); such nested posts run inside the outer one and nothing bounds
//! that recursion. Callers who need a bound wrap the outer `post` in a timeout.
//!
//! Only the delivering task counts as inside. A handler that spawns a task
//! which posts to the same bus and then awaits that task will never finish.

use async_trait::async_trait;
use futures::Stream;
use futures::future::join_all;
use officechat_core::error::BusError;
use officechat_core::message::{ChatMessage, preview};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, error, info};

use crate::tee::{FragmentStream, FragmentTee};

tokio::task_local! {
    /// Buses whose fan-out the current task is running.
    static DELIVERING: Vec<usize>;
}

/// Receives every message committed with [`OfficeChat::post`].
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    async fn on_message(&self, message: &ChatMessage) -> officechat_core::Result<()>;
}

/// Receives every message published with [`OfficeChat::post_streaming`].
#[async_trait]
pub trait StreamSubscriber: Send + Sync {
    fn name(&self) -> &str;

    /// `message` is the placeholder (`streaming == true`, empty content).
    /// `fragments` ends when the producer is exhausted.
    async fn on_stream(
        &self,
        message: &ChatMessage,
        fragments: FragmentStream,
    ) -> officechat_core::Result<()>;
}

/// The shared broadcast medium.
#[derive(Default)]
pub struct OfficeChat {
    log: RwLock<Vec<ChatMessage>>,
    subscribers: RwLock<Vec<Arc<dyn Subscriber>>>,
    stream_subscribers: RwLock<Vec<Arc<dyn StreamSubscriber>>>,
    publish_gate: Mutex<()>,
}

impl OfficeChat {
    pub fn new() -> Self {
        info!("Office chat initialized");
        Self::default()
    }

    /// Register a whole-message subscriber.
    pub async fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        debug!(subscriber = %subscriber.name(), "New subscriber added");
        self.subscribers.write().await.push(subscriber);
    }

    /// Register a streaming subscriber.
    pub async fn subscribe_streaming(&self, subscriber: Arc<dyn StreamSubscriber>) {
        debug!(subscriber = %subscriber.name(), "New streaming subscriber added");
        self.stream_subscribers.write().await.push(subscriber);
    }

    /// Commit a complete message and deliver it to every whole-message subscriber.
    ///
    /// All subscribers run to completion even if one fails. The message stays
    /// in history regardless; the first failure is returned to the caller.
    pub async fn post(
        &self,
        content: impl Into<String>,
        sender: impl Into<String>,
    ) -> Result<ChatMessage, BusError> {
        let message = ChatMessage::new(sender, content);
        let _turn = self.enter().await;
        info!(sender = %message.sender, content = %preview(&message.content), "Message posted");

        self.log.write().await.push(message.clone());

        // Snapshot so handlers may subscribe or post without holding our lock.
        let subscribers = self.subscribers.read().await.clone();
        debug!(count = subscribers.len(), sender = %message.sender, "Notifying subscribers");

        let results = self
            .deliver(join_all(subscribers.iter().map(|s| s.on_message(&message))))
            .await;
        first_failure(
            subscribers.iter().map(|s| s.name()),
            results,
            "Error notifying subscriber",
        )?;

        Ok(message)
    }

    /// Commit a streamed message.
    ///
    /// A placeholder is appended first. Every streaming subscriber receives it
    /// with its own copy of the fragments while the bus reads `fragments` once.
    /// When the source is exhausted the stored message gets the joined text and
    /// `streaming` flips to false. Returns the final committed message.
    pub async fn post_streaming<S>(
        &self,
        fragments: S,
        sender: impl Into<String>,
    ) -> Result<ChatMessage, BusError>
    where
        S: Stream<Item = String> + Send,
    {
        let placeholder = ChatMessage::placeholder(sender);
        let _turn = self.enter().await;
        info!(sender = %placeholder.sender, "Streaming message posted");

        let index = {
            let mut log = self.log.write().await;
            log.push(placeholder.clone());
            log.len() - 1
        };

        let subscribers = self.stream_subscribers.read().await.clone();
        debug!(count = subscribers.len(), "Notifying streaming subscribers");

        let (tee, streams) = FragmentTee::new(subscribers.len());
        let handlers = join_all(
            subscribers
                .iter()
                .zip(streams)
                .map(|(s, stream)| s.on_stream(&placeholder, stream)),
        );
        let (results, collected) = self
            .deliver(async { tokio::join!(handlers, tee.pump(fragments)) })
            .await;

        let committed = {
            let mut log = self.log.write().await;
            let slot = &mut log[index];
            slot.content = collected.concat();
            slot.streaming = false;
            slot.clone()
        };
        debug!(sender = %committed.sender, content = %preview(&committed.content), "Streaming message complete");

        first_failure(
            subscribers.iter().map(|s| s.name()),
            results,
            "Error notifying streaming subscriber",
        )?;

        Ok(committed)
    }

    /// The committed log, oldest first; `Some(n)` keeps only the last `n`.
    ///
    /// A streamed message still in flight shows up with empty content.
    pub async fn history(&self, limit: Option<usize>) -> Vec<ChatMessage> {
        let log = self.log.read().await;
        let start = match limit {
            Some(n) => log.len().saturating_sub(n),
            None => 0,
        };
        log[start..].to_vec()
    }

    /// Number of committed messages.
    pub async fn len(&self) -> usize {
        self.log.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.log.read().await.is_empty()
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len() + self.stream_subscribers.read().await.len()
    }

    fn id(&self) -> usize {
        std::ptr::from_ref(self) as usize
    }

    /// Wait for the publish turn, unless this task is already delivering
    /// for this bus and the post is a nested reply.
    async fn enter(&self) -> Option<MutexGuard<'_, ()>> {
        let nested = DELIVERING
            .try_with(|ids| ids.contains(&self.id()))
            .unwrap_or(false);
        if nested {
            return None;
        }
        Some(self.publish_gate.lock().await)
    }

    /// Run a fan-out with this bus marked as delivering.
    async fn deliver<F: Future>(&self, fanout: F) -> F::Output {
        let mut ids = DELIVERING.try_with(Clone::clone).unwrap_or_default();
        ids.push(self.id());
        DELIVERING.scope(ids, fanout).await
    }
}

/// Log every failed handler, then surface the first one.
fn first_failure<'a>(
    names: impl Iterator<Item = &'a str>,
    results: Vec<officechat_core::Result<()>>,
    context: &str,
) -> Result<(), BusError> {
    let mut first = None;
    for (name, result) in names.zip(results) {
        if let Err(e) = result {
            error!(subscriber = %name, error = %e, "{context}");
            first.get_or_insert_with(|| BusError::handler(name, &e));
        }
    }
    match first {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
