//! Inline, caller-blocking dispatch.

use std::sync::Arc;

use async_trait::async_trait;

use crate::dispatch::result::{DispatchResult, DispatchResults};
use crate::dispatch::strategy::{DispatchStrategy, StrategyId};
use crate::event::Event;
use crate::handle::Handle;

/// Invokes the handle inline on the dispatching task.
///
/// The outcome is resolved by the time `dispatch` returns. An underlying
/// failure becomes the outcome value; it is never re-raised, so sibling
/// handles keep executing.
#[derive(Debug, Default)]
pub struct SynchronousStrategy;

#[async_trait]
impl DispatchStrategy for SynchronousStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::SYNCHRONOUS
    }

    async fn dispatch(
        &self,
        handle: Arc<Handle>,
        event: Event,
        _prior: &DispatchResults,
    ) -> DispatchResult {
        let outcome = handle.invoke(&event);
        DispatchResult::new(handle.handler().clone(), event, outcome)
    }
}
