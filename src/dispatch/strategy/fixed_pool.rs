//! Shared bounded-worker dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::dispatch::result::{DispatchResult, DispatchResults, Outcome, PendingHandle};
use crate::dispatch::strategy::{join_failure, DispatchStrategy, StrategyId};
use crate::event::Event;
use crate::handle::Handle;

/// Submits invocations to a shared pool bounded at construction time.
///
/// At most `size` invocations execute concurrently; excess submissions queue
/// unboundedly behind the permit set (no admission control). `dispatch`
/// returns a pending outcome immediately.
#[derive(Debug)]
pub struct FixedPoolStrategy {
    permits: Arc<Semaphore>,
    size: usize,
}

impl FixedPoolStrategy {
    /// A pool allowing `size` concurrent invocations. A zero size would
    /// starve the pool forever, so it is clamped to one.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// The configured concurrency bound.
    pub fn size(&self) -> usize {
        self.size
    }
}

#[async_trait]
impl DispatchStrategy for FixedPoolStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::FIXED_POOL
    }

    async fn dispatch(
        &self,
        handle: Arc<Handle>,
        event: Event,
        _prior: &DispatchResults,
    ) -> DispatchResult {
        let (slot, pending) = PendingHandle::channel();
        let handler = handle.handler().clone();
        let permits = Arc::clone(&self.permits);

        let worker_event = event.clone();
        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                // Semaphore closed, engine shutting down; leave the slot
                // unfilled so callers observe the soft-failure path.
                warn!("fixed pool closed before invocation could run");
                return;
            };
            let outcome = tokio::task::spawn_blocking(move || handle.invoke(&worker_event))
                .await
                .unwrap_or_else(join_failure);
            slot.fill(outcome);
        });

        DispatchResult::new(handler, event, Outcome::Pending(pending))
    }
}
