//! Immutable handle descriptors.
//!
//! A descriptor binds one event type to one callable and, optionally, a
//! dispatch strategy id. Descriptors are produced once per handler-object
//! type (by a metadata provider or by hand), are instance-independent, and
//! may be cached and shared across every registration of that type.

use std::sync::Arc;

use crate::dispatch::result::HandlerValue;
use crate::dispatch::strategy::StrategyId;
use crate::error::InvocationError;
use crate::event::{Event, EventKey};
use crate::handle::DynHandler;

/// Type-erased target callable: `(handler object, event) -> value or
/// captured failure`.
pub type TargetFn =
    Arc<dyn Fn(&DynHandler, &Event) -> std::result::Result<HandlerValue, InvocationError> + Send + Sync>;

/// Immutable binding of an event type to a callable and a strategy id.
#[derive(Clone)]
pub struct HandleDescriptor {
    event_key: EventKey,
    strategy: Option<StrategyId>,
    method: Option<String>,
    target: TargetFn,
}

impl HandleDescriptor {
    /// Binds event type `E` to an infallible method of handler type `H`.
    pub fn of<H, E, R, F>(target: F) -> Self
    where
        H: Send + Sync + 'static,
        E: Send + Sync + 'static,
        R: Send + Sync + 'static,
        F: Fn(&H, &E) -> R + Send + Sync + 'static,
    {
        Self::build::<H, E, _>(move |handler, event| {
            Ok(Arc::new(target(handler, event)) as HandlerValue)
        })
    }

    /// Binds event type `E` to a fallible method of handler type `H`. An
    /// `Err` return becomes a captured [`InvocationError::Failed`] outcome.
    pub fn fallible<H, E, R, Err, F>(target: F) -> Self
    where
        H: Send + Sync + 'static,
        E: Send + Sync + 'static,
        R: Send + Sync + 'static,
        Err: std::fmt::Display,
        F: Fn(&H, &E) -> std::result::Result<R, Err> + Send + Sync + 'static,
    {
        Self::build::<H, E, _>(move |handler, event| match target(handler, event) {
            Ok(value) => Ok(Arc::new(value) as HandlerValue),
            Err(err) => Err(InvocationError::Failed(err.to_string())),
        })
    }

    fn build<H, E, F>(target: F) -> Self
    where
        H: Send + Sync + 'static,
        E: Send + Sync + 'static,
        F: Fn(&H, &E) -> std::result::Result<HandlerValue, InvocationError> + Send + Sync + 'static,
    {
        let erased: TargetFn = Arc::new(move |object: &DynHandler, event: &Event| {
            let handler = object
                .downcast_ref::<H>()
                .ok_or(InvocationError::TypeMismatch {
                    expected: std::any::type_name::<H>(),
                })?;
            let payload = event
                .payload_ref::<E>()
                .ok_or(InvocationError::TypeMismatch {
                    expected: std::any::type_name::<E>(),
                })?;
            target(handler, payload)
        });

        Self {
            event_key: EventKey::of::<E>(),
            strategy: None,
            method: None,
            target: erased,
        }
    }

    /// Declares the strategy id this binding should dispatch with.
    pub fn with_strategy(mut self, strategy: StrategyId) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Labels the bound method, for diagnostics.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// The event type this descriptor accepts.
    pub fn event_key(&self) -> &EventKey {
        &self.event_key
    }

    /// The declared strategy id, if any. `None` defers to the dispatch-time
    /// defaults.
    pub fn strategy(&self) -> Option<&StrategyId> {
        self.strategy.as_ref()
    }

    /// The method label, if any.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub(crate) fn target(&self) -> &TargetFn {
        &self.target
    }

    /// Returns a descriptor with unset fields stamped from the provider
    /// defaults. Shares `self` unchanged when nothing needs stamping.
    pub(crate) fn resolved(
        self: &Arc<Self>,
        default_strategy: Option<&StrategyId>,
        default_method: &str,
    ) -> Arc<Self> {
        let needs_strategy = self.strategy.is_none() && default_strategy.is_some();
        let needs_method = self.method.is_none();
        if !needs_strategy && !needs_method {
            return Arc::clone(self);
        }

        let mut stamped = (**self).clone();
        if needs_strategy {
            stamped.strategy = default_strategy.cloned();
        }
        if needs_method {
            stamped.method = Some(default_method.to_string());
        }
        Arc::new(stamped)
    }
}

impl std::fmt::Debug for HandleDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleDescriptor")
            .field("event_key", &self.event_key)
            .field("strategy", &self.strategy)
            .field("method", &self.method)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ledger {
        balance: i64,
    }

    struct Deposit {
        amount: i64,
    }

    #[test]
    fn typed_constructor_captures_event_key() {
        let descriptor = HandleDescriptor::of(|ledger: &Ledger, deposit: &Deposit| {
            ledger.balance + deposit.amount
        });
        assert_eq!(descriptor.event_key(), &EventKey::of::<Deposit>());
        assert!(descriptor.strategy().is_none());
    }

    #[test]
    fn target_downcasts_and_invokes() {
        let descriptor = HandleDescriptor::of(|ledger: &Ledger, deposit: &Deposit| {
            ledger.balance + deposit.amount
        });
        let object: DynHandler = Arc::new(Ledger { balance: 100 });
        let event = Event::new(Deposit { amount: 20 });

        let value = (descriptor.target())(&object, &event).unwrap();
        assert_eq!(*Arc::clone(&value).downcast::<i64>().unwrap(), 120);
    }

    #[test]
    fn mismatched_event_is_a_type_mismatch() {
        let descriptor = HandleDescriptor::of(|_: &Ledger, deposit: &Deposit| deposit.amount);
        let object: DynHandler = Arc::new(Ledger { balance: 0 });
        let event = Event::new("not a deposit");

        let err = (descriptor.target())(&object, &event).unwrap_err();
        assert!(matches!(err, InvocationError::TypeMismatch { .. }));
    }

    #[test]
    fn resolved_stamps_only_unset_fields() {
        let declared = Arc::new(
            HandleDescriptor::of(|_: &Ledger, d: &Deposit| d.amount)
                .with_strategy(StrategyId::new("custom"))
                .with_method("apply"),
        );
        let stamped = declared.resolved(Some(&StrategyId::new("fallback")), "handle");
        assert!(Arc::ptr_eq(&declared, &stamped));

        let bare = Arc::new(HandleDescriptor::of(|_: &Ledger, d: &Deposit| d.amount));
        let stamped = bare.resolved(Some(&StrategyId::new("fallback")), "handle");
        assert_eq!(stamped.strategy().unwrap().as_str(), "fallback");
        assert_eq!(stamped.method(), Some("handle"));
    }
}
