//! Event objects and their dispatch keys.
//!
//! An [`Event`] is a cheaply cloneable wrapper around an arbitrary payload.
//! Its [`EventKey`] is derived from the payload's concrete runtime type and
//! is the only thing lookups consider: dispatch keying is exact, with no
//! supertype widening. A payload of a different concrete type never matches,
//! even if the two types are convertible.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity key for an event's runtime type.
///
/// Equality and hashing consider only the [`TypeId`]; the type name rides
/// along for logging and diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct EventKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl EventKey {
    /// The key for event type `E`.
    pub fn of<E: Any>() -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            type_name: std::any::type_name::<E>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for EventKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for EventKey {}

impl Hash for EventKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// A dispatchable event: a type-erased payload plus its dispatch key.
#[derive(Clone)]
pub struct Event {
    key: EventKey,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Event {
    /// Wraps a payload, capturing its concrete type as the dispatch key.
    pub fn new<E: Any + Send + Sync>(payload: E) -> Self {
        Self {
            key: EventKey::of::<E>(),
            payload: Arc::new(payload),
        }
    }

    pub fn key(&self) -> &EventKey {
        &self.key
    }

    /// Borrows the payload as `E`, if that is its concrete type.
    pub fn payload_ref<E: Any + Send + Sync>(&self) -> Option<&E> {
        self.payload.downcast_ref::<E>()
    }

    /// Shares the payload as `Arc<E>`, if that is its concrete type.
    pub fn payload_as<E: Any + Send + Sync>(&self) -> Option<Arc<E>> {
        Arc::clone(&self.payload).downcast::<E>().ok()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OrderPlaced {
        order_id: u64,
    }

    struct OrderCancelled;

    #[test]
    fn key_equality_is_type_identity() {
        assert_eq!(EventKey::of::<OrderPlaced>(), EventKey::of::<OrderPlaced>());
        assert_ne!(
            EventKey::of::<OrderPlaced>(),
            EventKey::of::<OrderCancelled>()
        );
    }

    #[test]
    fn event_captures_payload_type() {
        let event = Event::new(OrderPlaced { order_id: 7 });
        assert_eq!(event.key(), &EventKey::of::<OrderPlaced>());
        assert_eq!(event.payload_ref::<OrderPlaced>().unwrap().order_id, 7);
        assert!(event.payload_ref::<OrderCancelled>().is_none());
    }

    #[test]
    fn clones_share_the_payload() {
        let event = Event::new(OrderPlaced { order_id: 9 });
        let copy = event.clone();
        let a = event.payload_as::<OrderPlaced>().unwrap();
        let b = copy.payload_as::<OrderPlaced>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
