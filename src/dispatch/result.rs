//! Per-invocation outcomes and the ordered aggregate for one dispatch call.
//!
//! A [`DispatchResult`] is created by the strategy that executed (or
//! submitted) a handle invocation. Blocking strategies resolve the outcome
//! up front; offloading strategies return an [`Outcome::Pending`] whose value
//! arrives later through a watch channel. [`DispatchResult::result`] unifies
//! the two: it transparently awaits pending outcomes, looping on nested
//! pendings, and falls back to the raw pending handle if the worker went
//! away without reporting. That fallback is deliberate soft failure, never an
//! error.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::dispatch::flow::FlowControl;
use crate::error::InvocationError;
use crate::event::Event;
use crate::handle::HandlerRef;

/// Value produced by a successful handle invocation.
pub type HandlerValue = Arc<dyn Any + Send + Sync>;

/// Outcome of one handle invocation.
#[derive(Clone)]
pub enum Outcome {
    /// The invocation returned a value.
    Value(HandlerValue),
    /// The invocation failed; the failure is the outcome, not an error.
    Failure(InvocationError),
    /// The invocation was submitted to a worker and has not resolved yet.
    Pending(PendingHandle),
}

impl Outcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending(_))
    }

    /// Downcasts a resolved value to `T`.
    pub fn value_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Outcome::Value(value) => Arc::clone(value).downcast::<T>().ok(),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&InvocationError> {
        match self {
            Outcome::Failure(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(_) => f.debug_tuple("Value").field(&"<dyn Any>").finish(),
            Outcome::Failure(err) => f.debug_tuple("Failure").field(err).finish(),
            Outcome::Pending(handle) => f.debug_tuple("Pending").field(handle).finish(),
        }
    }
}

/// Receiving side of a deferred outcome.
///
/// Cloneable; every clone observes the same resolution.
#[derive(Clone)]
pub struct PendingHandle {
    rx: watch::Receiver<Option<Outcome>>,
}

impl PendingHandle {
    /// Creates the slot/handle pair for one deferred invocation.
    pub(crate) fn channel() -> (OutcomeSlot, PendingHandle) {
        let (tx, rx) = watch::channel(None);
        (OutcomeSlot { tx }, PendingHandle { rx })
    }

    /// The resolved outcome, if the worker has already reported.
    pub fn try_resolved(&self) -> Option<Outcome> {
        self.rx.borrow().clone()
    }

    /// Waits for the worker to report. `None` means the worker was dropped
    /// without resolving.
    pub(crate) async fn wait(&self) -> Option<Outcome> {
        let mut rx = self.rx.clone();
        loop {
            if let Some(outcome) = rx.borrow_and_update().clone() {
                return Some(outcome);
            }
            if rx.changed().await.is_err() {
                return rx.borrow().clone();
            }
        }
    }
}

impl fmt::Debug for PendingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.try_resolved().is_some() {
            "resolved"
        } else {
            "pending"
        };
        f.debug_tuple("PendingHandle").field(&state).finish()
    }
}

/// Producing side of a deferred outcome; filled exactly once by a worker.
pub(crate) struct OutcomeSlot {
    tx: watch::Sender<Option<Outcome>>,
}

impl OutcomeSlot {
    pub(crate) fn fill(self, outcome: Outcome) {
        let _ = self.tx.send(Some(outcome));
    }
}

/// Result of dispatching one event to one handle.
pub struct DispatchResult {
    handler: HandlerRef,
    event: Event,
    outcome: Outcome,
    dispatched_at: DateTime<Utc>,
    flow: Mutex<FlowControl>,
}

impl DispatchResult {
    /// Builds a result for an invocation owned by `handler`.
    pub fn new(handler: HandlerRef, event: Event, outcome: Outcome) -> Self {
        Self {
            handler,
            event,
            outcome,
            dispatched_at: Utc::now(),
            flow: Mutex::new(FlowControl::default()),
        }
    }

    /// The handler whose handle produced this result.
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// The event that was dispatched.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Submission timestamp, in submission order across the call.
    pub fn dispatched_at(&self) -> DateTime<Utc> {
        self.dispatched_at
    }

    /// The outcome as stored, without resolving pending work.
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Resolves the outcome, awaiting pending work as needed.
    ///
    /// Nested pending outcomes are unwrapped until a settled value or
    /// failure appears. If a worker vanished without reporting, the raw
    /// pending outcome is returned as-is.
    pub async fn result(&self) -> Outcome {
        let mut current = self.outcome.clone();
        loop {
            match current {
                Outcome::Pending(ref pending) => match pending.wait().await {
                    Some(next) => current = next,
                    None => return current,
                },
                resolved => return resolved,
            }
        }
    }

    pub fn flow_control(&self) -> FlowControl {
        *self.flow.lock()
    }

    /// Attaches a flow control directive, read by the dispatcher after this
    /// result is appended. Intended for strategies.
    pub fn set_flow_control(&self, flow: FlowControl) {
        *self.flow.lock() = flow;
    }
}

impl fmt::Debug for DispatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchResult")
            .field("handler", &self.handler.id())
            .field("event", self.event.key())
            .field("outcome", &self.outcome)
            .field("flow", &self.flow_control())
            .finish()
    }
}

/// Ordered, append-only aggregate of one dispatch call.
///
/// Order is submission order, not completion order. For non-blocking
/// strategies, presence here means "submitted", not "finished"; callers
/// needing final values resolve each entry with [`DispatchResult::result`].
#[derive(Debug, Default)]
pub struct DispatchResults {
    results: Vec<DispatchResult>,
}

impl DispatchResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, result: DispatchResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DispatchResult> {
        self.results.get(index)
    }

    pub fn first(&self) -> Option<&DispatchResult> {
        self.results.first()
    }

    pub fn last(&self) -> Option<&DispatchResult> {
        self.results.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DispatchResult> {
        self.results.iter()
    }
}

impl<'a> IntoIterator for &'a DispatchResults {
    type Item = &'a DispatchResult;
    type IntoIter = std::slice::Iter<'a, DispatchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl IntoIterator for DispatchResults {
    type Item = DispatchResult;
    type IntoIter = std::vec::IntoIter<DispatchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
