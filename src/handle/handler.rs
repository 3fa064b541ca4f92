//! Registered handler objects and their handle indexes.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{DispatchError, Result};
use crate::event::EventKey;
use crate::handle::descriptor::HandleDescriptor;
use crate::handle::handle::{Handle, HandlerRef};
use crate::handle::DynHandler;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    pub(crate) fn next() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler-{}", self.0)
    }
}

/// One registered handler object plus its event-type -> handle index.
///
/// Construction is atomic: it fails with a validation error when zero
/// descriptors are supplied, leaving nothing behind.
pub struct Handler {
    id: HandlerId,
    object: DynHandler,
    handles: HashMap<EventKey, Vec<Arc<Handle>>>,
}

impl Handler {
    /// Binds `descriptors` to `object`, preserving descriptor order within
    /// each event type.
    pub(crate) fn new(object: DynHandler, descriptors: &[Arc<HandleDescriptor>]) -> Result<Self> {
        if descriptors.is_empty() {
            return Err(DispatchError::Validation(
                "handler object resolved zero handle descriptors".to_string(),
            ));
        }

        let id = HandlerId::next();
        let mut handles: HashMap<EventKey, Vec<Arc<Handle>>> = HashMap::new();
        for descriptor in descriptors {
            let handle = Handle::new(
                HandlerRef::new(id, Arc::clone(&object)),
                Arc::clone(descriptor),
            );
            handles
                .entry(*descriptor.event_key())
                .or_default()
                .push(Arc::new(handle));
        }

        Ok(Self {
            id,
            object,
            handles,
        })
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    pub fn object(&self) -> &DynHandler {
        &self.object
    }

    /// The event types this handler is indexed under.
    pub fn event_keys(&self) -> impl Iterator<Item = &EventKey> {
        self.handles.keys()
    }

    /// The ordered handles accepting `key`; empty when none match.
    pub fn handles_for(&self, key: &EventKey) -> &[Arc<Handle>] {
        self.handles.get(key).map_or(&[], Vec::as_slice)
    }

    /// Total number of bound handles across all event types.
    pub fn handle_count(&self) -> usize {
        self.handles.values().map(Vec::len).sum()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("id", &self.id)
            .field("events", &self.handles.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    struct Auditor;

    struct Credit(i64);
    struct Debit(i64);

    #[test]
    fn zero_descriptors_fail_validation() {
        let object: DynHandler = Arc::new(Auditor);
        let err = Handler::new(object, &[]).unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
    }

    #[test]
    fn descriptors_group_by_event_type_in_order() {
        let object: DynHandler = Arc::new(Auditor);
        let descriptors = vec![
            Arc::new(HandleDescriptor::of(|_: &Auditor, c: &Credit| c.0)),
            Arc::new(HandleDescriptor::of(|_: &Auditor, c: &Credit| c.0 * 2)),
            Arc::new(HandleDescriptor::of(|_: &Auditor, d: &Debit| -d.0)),
        ];
        let handler = Handler::new(object, &descriptors).unwrap();

        assert_eq!(handler.handle_count(), 3);
        let credits = handler.handles_for(&EventKey::of::<Credit>());
        assert_eq!(credits.len(), 2);
        assert_eq!(handler.handles_for(&EventKey::of::<Debit>()).len(), 1);
        assert!(handler.handles_for(&EventKey::of::<String>()).is_empty());

        // Descriptor order survives within the event-type bucket.
        let event = Event::new(Credit(5));
        assert_eq!(*credits[0].invoke(&event).value_as::<i64>().unwrap(), 5);
        assert_eq!(*credits[1].invoke(&event).value_as::<i64>().unwrap(), 10);
    }

    #[test]
    fn handles_share_the_handler_identity() {
        let object: DynHandler = Arc::new(Auditor);
        let descriptors = vec![Arc::new(HandleDescriptor::of(|_: &Auditor, c: &Credit| c.0))];
        let handler = Handler::new(Arc::clone(&object), &descriptors).unwrap();

        let handle = &handler.handles_for(&EventKey::of::<Credit>())[0];
        assert_eq!(handle.handler().id(), handler.id());
        assert!(handle.handler().object_is(&object));
    }
}
