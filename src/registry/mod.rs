//! # Registry
//!
//! Handler registration and event-keyed lookup.

pub mod handler_registry;

pub use handler_registry::HandlerRegistry;
