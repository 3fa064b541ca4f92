//! # Dispatcher
//!
//! Fans an event out across handlers in deterministic order.
//!
//! ## Overview
//!
//! For each handler, in the order the caller supplies them, the dispatcher
//! walks that handler's handles for the event's key and submits each one to
//! its resolved strategy. Results accumulate in submission order and any
//! result can halt the remaining fan-out through its flow control.
//!
//! Strategy resolution per handle, first match wins:
//!
//! 1. the handle's declared strategy id, by exact registry lookup
//! 2. the caller-supplied default for this dispatch call
//! 3. the registry's configured default
//! 4. in-line synchronous execution
//!
//! An unknown strategy id is never an error; it just falls through.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::dispatch::result::DispatchResults;
use crate::dispatch::strategy::{
    AsynchronousStrategy, DispatchStrategy, DispatchStrategyRegistry, StrategyId,
    SynchronousStrategy,
};
use crate::event::Event;
use crate::handle::Handler;

/// Fan-out engine over a strategy registry.
pub struct Dispatcher {
    strategies: DispatchStrategyRegistry,
}

impl Dispatcher {
    /// Creates a dispatcher with the synchronous and asynchronous strategies
    /// pre-registered and synchronous as the default.
    pub fn new() -> Self {
        let mut strategies = DispatchStrategyRegistry::new();
        strategies.add(Arc::new(AsynchronousStrategy));
        strategies.set_default_strategy(Arc::new(SynchronousStrategy));
        Self { strategies }
    }

    /// The underlying strategy registry.
    pub fn strategies(&self) -> &DispatchStrategyRegistry {
        &self.strategies
    }

    pub fn strategies_mut(&mut self) -> &mut DispatchStrategyRegistry {
        &mut self.strategies
    }

    /// Dispatches `event` to every matching handle of `handlers`, resolving
    /// each handle's strategy through the registry.
    pub async fn dispatch(&self, event: Event, handlers: &[Arc<Handler>]) -> DispatchResults {
        self.dispatch_inner(event, handlers, None, None).await
    }

    /// Like [`dispatch`](Self::dispatch), but `default` overrides the
    /// registry's configured default for handles with no usable strategy id.
    pub async fn dispatch_with_default(
        &self,
        event: Event,
        handlers: &[Arc<Handler>],
        default: &StrategyId,
    ) -> DispatchResults {
        self.dispatch_inner(event, handlers, Some(default), None)
            .await
    }

    /// Dispatches every matching handle through `strategy`, ignoring the
    /// handles' declared strategy ids. Each submission sees an empty prior
    /// results view.
    pub async fn dispatch_with(
        &self,
        event: Event,
        handlers: &[Arc<Handler>],
        strategy: Arc<dyn DispatchStrategy>,
    ) -> DispatchResults {
        self.dispatch_inner(event, handlers, None, Some(strategy))
            .await
    }

    async fn dispatch_inner(
        &self,
        event: Event,
        handlers: &[Arc<Handler>],
        call_default: Option<&StrategyId>,
        forced: Option<Arc<dyn DispatchStrategy>>,
    ) -> DispatchResults {
        let mut results = DispatchResults::new();
        let empty_prior = DispatchResults::new();

        debug!(
            event = %event.key(),
            handlers = handlers.len(),
            "dispatching event"
        );

        'fan_out: for handler in handlers {
            for handle in handler.handles_for(event.key()) {
                let strategy = match &forced {
                    Some(strategy) => Arc::clone(strategy),
                    None => self.resolve(handle.strategy_id(), call_default),
                };
                trace!(
                    handler = %handler.id(),
                    strategy = %strategy.id(),
                    "submitting handle"
                );

                // A forced strategy sees no earlier results, matching its
                // uniform treatment of every handle.
                let prior = if forced.is_some() {
                    &empty_prior
                } else {
                    &results
                };
                let result = strategy
                    .dispatch(Arc::clone(handle), event.clone(), prior)
                    .await;
                let stop = result.flow_control().is_stop();
                results.push(result);
                if stop {
                    debug!(event = %event.key(), "fan-out stopped by handler");
                    break 'fan_out;
                }
            }
        }

        results
    }

    fn resolve(
        &self,
        declared: Option<&StrategyId>,
        call_default: Option<&StrategyId>,
    ) -> Arc<dyn DispatchStrategy> {
        if let Some(id) = declared {
            if let Some(strategy) = self.strategies.lookup(id) {
                return strategy;
            }
            debug!(strategy = %id, "unknown strategy id on handle, falling back");
        }
        if let Some(id) = call_default {
            if let Some(strategy) = self.strategies.lookup(id) {
                return strategy;
            }
        }
        self.strategies
            .default_strategy()
            .unwrap_or_else(|| Arc::new(SynchronousStrategy))
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
