//! # Dispatch Strategies
//!
//! Pluggable execution policies for a single handle invocation. The built-in
//! strategies cover the spectrum from fully inline to per-handler serialized:
//!
//! - [`SynchronousStrategy`]: invokes inline; the caller waits.
//! - [`AsynchronousStrategy`]: one-shot worker per call, unbounded by design.
//! - [`FixedPoolStrategy`]: bounded concurrency, unbounded queue.
//! - [`HandlerQueuedStrategy`]: FIFO, non-concurrent execution per handler.
//!
//! Strategies are registered by id in a [`DispatchStrategyRegistry`]; lookup
//! of an unknown id silently falls back to the configured default rather
//! than failing.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::dispatch::result::{DispatchResult, DispatchResults};
use crate::event::Event;
use crate::handle::Handle;

pub mod asynchronous;
pub mod fixed_pool;
pub mod handler_queued;
pub mod registry;
pub mod synchronous;

pub use asynchronous::AsynchronousStrategy;
pub use fixed_pool::FixedPoolStrategy;
pub use handler_queued::HandlerQueuedStrategy;
pub use registry::DispatchStrategyRegistry;
pub use synchronous::SynchronousStrategy;

/// Identifier a descriptor or caller uses to select a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StrategyId(Cow<'static, str>);

impl StrategyId {
    /// Id of the built-in [`SynchronousStrategy`].
    pub const SYNCHRONOUS: StrategyId = StrategyId::from_static("synchronous");
    /// Id of the built-in [`AsynchronousStrategy`].
    pub const ASYNCHRONOUS: StrategyId = StrategyId::from_static("asynchronous");
    /// Id of the built-in [`FixedPoolStrategy`].
    pub const FIXED_POOL: StrategyId = StrategyId::from_static("fixed-pool");
    /// Id of the built-in [`HandlerQueuedStrategy`].
    pub const HANDLER_QUEUED: StrategyId = StrategyId::from_static("handler-queued");

    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps a lost pooled worker into a captured failure outcome.
pub(crate) fn join_failure(err: tokio::task::JoinError) -> crate::dispatch::result::Outcome {
    crate::dispatch::result::Outcome::Failure(crate::error::InvocationError::Panicked(
        err.to_string(),
    ))
}

/// Execution policy for one handle invocation.
///
/// `dispatch` either resolves the outcome before returning (blocking
/// strategies) or submits the work and returns a pending outcome
/// immediately. `prior` exposes the results already collected in the current
/// dispatch call, in submission order; custom strategies may use it to make
/// flow decisions.
#[async_trait]
pub trait DispatchStrategy: Send + Sync {
    /// The id this strategy is registered and selected by.
    fn id(&self) -> StrategyId;

    /// Executes or submits one handle invocation for `event`.
    async fn dispatch(
        &self,
        handle: Arc<Handle>,
        event: Event,
        prior: &DispatchResults,
    ) -> DispatchResult;
}
