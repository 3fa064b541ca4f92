//! Bound, invokable handles.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::debug;

use crate::dispatch::result::Outcome;
use crate::dispatch::strategy::StrategyId;
use crate::error::{panic_message, InvocationError};
use crate::event::{Event, EventKey};
use crate::handle::descriptor::HandleDescriptor;
use crate::handle::handler::HandlerId;
use crate::handle::DynHandler;

/// Lightweight back-reference to the handler a handle belongs to.
///
/// Stored in handles and dispatch results instead of the full handler to
/// keep ownership acyclic.
#[derive(Clone)]
pub struct HandlerRef {
    id: HandlerId,
    object: DynHandler,
}

impl HandlerRef {
    pub(crate) fn new(id: HandlerId, object: DynHandler) -> Self {
        Self { id, object }
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// The registered handler object.
    pub fn object(&self) -> &DynHandler {
        &self.object
    }

    /// Identity comparison against a registered object.
    pub fn object_is(&self, other: &DynHandler) -> bool {
        Arc::ptr_eq(&self.object, other)
    }

    #[cfg(test)]
    pub(crate) fn for_tests(object: DynHandler) -> Self {
        Self {
            id: HandlerId::next(),
            object,
        }
    }
}

impl std::fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("HandlerRef").field(&self.id).finish()
    }
}

/// One bound, invokable (handler, descriptor) pair.
///
/// Immutable after construction. Invocation never lets a failure escape:
/// panics and fallible-handler errors are captured into the outcome.
pub struct Handle {
    handler: HandlerRef,
    descriptor: Arc<HandleDescriptor>,
}

impl Handle {
    pub(crate) fn new(handler: HandlerRef, descriptor: Arc<HandleDescriptor>) -> Self {
        Self {
            handler,
            descriptor,
        }
    }

    /// Invokes the target callable with `event`, reporting a value-or-error
    /// outcome. Never panics across this boundary.
    pub fn invoke(&self, event: &Event) -> Outcome {
        let call = catch_unwind(AssertUnwindSafe(|| {
            (self.descriptor.target())(&self.handler.object, event)
        }));

        match call {
            Ok(Ok(value)) => Outcome::Value(value),
            Ok(Err(err)) => {
                debug!(handler = %self.handler.id(), event = %event.key(), error = %err, "handle invocation failed");
                Outcome::Failure(err)
            }
            Err(payload) => {
                let err = InvocationError::Panicked(panic_message(payload));
                debug!(handler = %self.handler.id(), event = %event.key(), error = %err, "handle invocation panicked");
                Outcome::Failure(err)
            }
        }
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    pub fn descriptor(&self) -> &Arc<HandleDescriptor> {
        &self.descriptor
    }

    /// The event type this handle accepts.
    pub fn event_key(&self) -> &EventKey {
        self.descriptor.event_key()
    }

    /// The strategy id declared for this handle, if any.
    pub fn strategy_id(&self) -> Option<&StrategyId> {
        self.descriptor.strategy()
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("handler", &self.handler.id())
            .field("event_key", self.event_key())
            .field("strategy", &self.strategy_id())
            .finish()
    }
}
