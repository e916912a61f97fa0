//! Query lifecycle events and the broadcaster that fans them out.
//!
//! The runner fires one before-event and one after-event per externally
//! visible execution. Subscriber work is spawned immediately (fire and
//! continue) and collected on a [`BroadcasterResult`] completion token that
//! the runner awaits exactly once, after the after-broadcast, on every exit
//! path.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::result::RawPayload;
use crate::value::Value;

/// Payload of the before-query notification.
#[derive(Debug, Clone)]
pub struct QueryEvent {
    pub query: String,
    pub parameters: Vec<Value>,
}

/// Payload of the after-query notification.
///
/// `execution_time` and `raw` are present on success; `error` carries the
/// driver message on failure.
#[derive(Debug, Clone)]
pub struct QueryResultEvent {
    pub query: String,
    pub parameters: Vec<Value>,
    pub success: bool,
    pub execution_time: Option<Duration>,
    pub raw: Option<RawPayload>,
    pub error: Option<String>,
}

/// Completion token for outstanding subscriber work.
#[derive(Debug, Default)]
pub struct BroadcasterResult {
    pending: Vec<JoinHandle<()>>,
}

impl BroadcasterResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a subscriber future and track its completion.
    pub fn register<F>(&mut self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.pending.push(tokio::spawn(fut));
    }

    /// Number of tracked subscriber tasks.
    pub fn count(&self) -> usize {
        self.pending.len()
    }

    /// Wait for every tracked task. A panicked subscriber does not fail the
    /// query that triggered it.
    pub async fn wait(&mut self) {
        for result in join_all(self.pending.drain(..)).await {
            if let Err(err) = result {
                tracing::warn!(error = %err, "query subscriber task failed");
            }
        }
    }
}

/// A registered listener for query lifecycle events.
#[async_trait]
pub trait QuerySubscriber: Send + Sync {
    async fn before_query(&self, event: QueryEvent);
    async fn after_query(&self, event: QueryResultEvent);
}

/// Fans lifecycle events out to registered subscribers.
#[derive(Default)]
pub struct EventBroadcaster {
    subscribers: Vec<Arc<dyn QuerySubscriber>>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: Arc<dyn QuerySubscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn broadcast_before_query(
        &self,
        result: &mut BroadcasterResult,
        query: &str,
        parameters: &[Value],
    ) {
        if self.subscribers.is_empty() {
            return;
        }
        let event = QueryEvent {
            query: query.to_string(),
            parameters: parameters.to_vec(),
        };
        for subscriber in &self.subscribers {
            let subscriber = Arc::clone(subscriber);
            let event = event.clone();
            result.register(async move { subscriber.before_query(event).await });
        }
    }

    pub fn broadcast_after_query(&self, result: &mut BroadcasterResult, event: QueryResultEvent) {
        if self.subscribers.is_empty() {
            return;
        }
        for subscriber in &self.subscribers {
            let subscriber = Arc::clone(subscriber);
            let event = event.clone();
            result.register(async move { subscriber.after_query(event).await });
        }
    }
}
