//! # Engine Facade
//!
//! One front door tying the handler registry and the dispatcher together.
//!
//! ## Usage
//!
//! ```text
//! let mut engine = DispatchEngine::new(provider);
//! engine.handlers_mut().register(Mailer)?;
//! let results = engine.dispatch(SignupCompleted { .. }).await;
//! ```

use std::sync::Arc;

use crate::dispatch::strategy::{DispatchStrategy, StrategyId, SynchronousStrategy};
use crate::dispatch::{DispatchResults, Dispatcher};
use crate::event::Event;
use crate::handle::meta::MetadataProvider;
use crate::registry::HandlerRegistry;

/// Combined registry plus dispatcher.
pub struct DispatchEngine {
    handlers: HandlerRegistry,
    dispatcher: Dispatcher,
}

impl DispatchEngine {
    /// Creates an engine whose descriptor discovery runs through `provider`.
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            handlers: HandlerRegistry::new(provider),
            dispatcher: Dispatcher::new(),
        }
    }

    /// Creates an engine around an already configured registry.
    pub fn with_registry(handlers: HandlerRegistry) -> Self {
        Self {
            handlers,
            dispatcher: Dispatcher::new(),
        }
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Dispatches `payload` to every registered handler accepting its type,
    /// resolving each handle's own strategy.
    pub async fn dispatch<E: Send + Sync + 'static>(&self, payload: E) -> DispatchResults {
        let event = Event::new(payload);
        let handlers = self.handlers.get(&event);
        self.dispatcher.dispatch(event, handlers).await
    }

    /// Dispatches `payload` with `default` overriding the dispatcher's
    /// configured default strategy for this call.
    pub async fn dispatch_with_default<E: Send + Sync + 'static>(
        &self,
        payload: E,
        default: &StrategyId,
    ) -> DispatchResults {
        let event = Event::new(payload);
        let handlers = self.handlers.get(&event);
        self.dispatcher
            .dispatch_with_default(event, handlers, default)
            .await
    }

    /// Dispatches `payload` through `strategy` uniformly, ignoring declared
    /// strategy ids.
    pub async fn dispatch_with<E: Send + Sync + 'static>(
        &self,
        payload: E,
        strategy: Arc<dyn DispatchStrategy>,
    ) -> DispatchResults {
        let event = Event::new(payload);
        let handlers = self.handlers.get(&event);
        self.dispatcher.dispatch_with(event, handlers, strategy).await
    }

    /// Dispatches `payload` in-line on the calling task, every handle
    /// resolved before return.
    pub async fn synchronous_dispatch<E: Send + Sync + 'static>(
        &self,
        payload: E,
    ) -> DispatchResults {
        self.dispatch_with(payload, Arc::new(SynchronousStrategy))
            .await
    }
}
