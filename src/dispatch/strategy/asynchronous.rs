//! One-shot worker per dispatch.

use std::sync::Arc;

use async_trait::async_trait;

use crate::dispatch::result::{DispatchResult, DispatchResults, Outcome, PendingHandle};
use crate::dispatch::strategy::{DispatchStrategy, StrategyId};
use crate::event::Event;
use crate::handle::Handle;

/// Spawns a dedicated one-shot blocking worker for every call and returns a
/// pending outcome immediately.
///
/// No worker reuse and no admission control: concurrency is unbounded by
/// design, which is a known resource-exhaustion risk under high fan-out.
#[derive(Debug, Default)]
pub struct AsynchronousStrategy;

#[async_trait]
impl DispatchStrategy for AsynchronousStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::ASYNCHRONOUS
    }

    async fn dispatch(
        &self,
        handle: Arc<Handle>,
        event: Event,
        _prior: &DispatchResults,
    ) -> DispatchResult {
        let (slot, pending) = PendingHandle::channel();
        let handler = handle.handler().clone();

        let worker_event = event.clone();
        tokio::task::spawn_blocking(move || {
            slot.fill(handle.invoke(&worker_event));
        });

        DispatchResult::new(handler, event, Outcome::Pending(pending))
    }
}
