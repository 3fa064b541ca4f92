//! Per-handler serialized dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::dispatch::result::{DispatchResult, DispatchResults, Outcome, OutcomeSlot, PendingHandle};
use crate::dispatch::strategy::{join_failure, DispatchStrategy, StrategyId};
use crate::event::Event;
use crate::handle::{Handle, HandlerId};

struct QueuedInvocation {
    handle: Arc<Handle>,
    event: Event,
    slot: OutcomeSlot,
}

/// Serializes all dispatches to one handler through a dedicated worker.
///
/// The worker and its queue are created lazily on the first dispatch to a
/// handler and reused for that handler's lifetime. Invocations for one
/// handler run FIFO and never overlap; distinct handlers execute
/// concurrently with each other. `dispatch` returns a pending outcome
/// immediately.
#[derive(Debug, Default)]
pub struct HandlerQueuedStrategy {
    workers: DashMap<HandlerId, mpsc::UnboundedSender<QueuedInvocation>>,
}

impl HandlerQueuedStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handler workers spawned so far.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    fn worker_for(&self, handler: HandlerId) -> mpsc::UnboundedSender<QueuedInvocation> {
        self.workers
            .entry(handler)
            .or_insert_with(|| {
                debug!(%handler, "starting queued dispatch worker");
                let (tx, mut rx) = mpsc::unbounded_channel::<QueuedInvocation>();
                tokio::spawn(async move {
                    // Awaiting each invocation before the next recv is what
                    // guarantees FIFO, non-overlapping execution.
                    while let Some(invocation) = rx.recv().await {
                        let QueuedInvocation {
                            handle,
                            event,
                            slot,
                        } = invocation;
                        let outcome =
                            tokio::task::spawn_blocking(move || handle.invoke(&event))
                                .await
                                .unwrap_or_else(join_failure);
                        slot.fill(outcome);
                    }
                });
                tx
            })
            .clone()
    }
}

#[async_trait]
impl DispatchStrategy for HandlerQueuedStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::HANDLER_QUEUED
    }

    async fn dispatch(
        &self,
        handle: Arc<Handle>,
        event: Event,
        _prior: &DispatchResults,
    ) -> DispatchResult {
        let (slot, pending) = PendingHandle::channel();
        let handler = handle.handler().clone();

        let worker = self.worker_for(handler.id());
        let submission = QueuedInvocation {
            handle,
            event: event.clone(),
            slot,
        };
        if worker.send(submission).is_err() {
            // Worker task is gone (runtime shutdown); the dropped slot makes
            // the pending outcome resolve through the soft-failure path.
            warn!(handler = %handler.id(), "queued dispatch worker unavailable");
        }

        DispatchResult::new(handler, event, Outcome::Pending(pending))
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use parking_lot::Mutex;

    use super::*;
    use crate::handle::descriptor::HandleDescriptor;
    use crate::handle::{DynHandler, Handler};

    struct Recorder {
        intervals: Arc<Mutex<Vec<(Instant, Instant)>>>,
    }

    struct Pulse;

    impl Recorder {
        fn record(&self) {
            let start = Instant::now();
            std::thread::sleep(Duration::from_millis(40));
            self.intervals.lock().push((start, Instant::now()));
        }
    }

    fn recorder_handler(intervals: Arc<Mutex<Vec<(Instant, Instant)>>>) -> Handler {
        let object: DynHandler = Arc::new(Recorder { intervals });
        let descriptors = vec![Arc::new(HandleDescriptor::of(|r: &Recorder, _: &Pulse| {
            r.record()
        }))];
        Handler::new(object, &descriptors).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_handler_runs_fifo_without_overlap() {
        let strategy = HandlerQueuedStrategy::new();
        let intervals = Arc::new(Mutex::new(Vec::new()));
        let handler = recorder_handler(Arc::clone(&intervals));
        let handle = &handler.handles_for(&crate::event::EventKey::of::<Pulse>())[0];

        let first = strategy
            .dispatch(Arc::clone(handle), Event::new(Pulse), &DispatchResults::new())
            .await;
        let second = strategy
            .dispatch(Arc::clone(handle), Event::new(Pulse), &DispatchResults::new())
            .await;

        assert!(!first.result().await.is_pending());
        assert!(!second.result().await.is_pending());
        assert_eq!(strategy.worker_count(), 1);

        let intervals = intervals.lock();
        assert_eq!(intervals.len(), 2);
        // Submission order, and the first must finish before the second starts.
        assert!(intervals[0].1 <= intervals[1].0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn distinct_handlers_get_distinct_workers() {
        let strategy = HandlerQueuedStrategy::new();
        let intervals = Arc::new(Mutex::new(Vec::new()));
        let first = recorder_handler(Arc::clone(&intervals));
        let second = recorder_handler(Arc::clone(&intervals));

        let key = crate::event::EventKey::of::<Pulse>();
        let a = strategy
            .dispatch(
                Arc::clone(&first.handles_for(&key)[0]),
                Event::new(Pulse),
                &DispatchResults::new(),
            )
            .await;
        let b = strategy
            .dispatch(
                Arc::clone(&second.handles_for(&key)[0]),
                Event::new(Pulse),
                &DispatchResults::new(),
            )
            .await;

        assert!(!a.result().await.is_pending());
        assert!(!b.result().await.is_pending());
        assert_eq!(strategy.worker_count(), 2);
    }
}
