//! Structured error handling for the dispatch engine.
//!
//! Two error families with very different lifecycles:
//!
//! - [`DispatchError`] is fatal to the operation that raised it and is only
//!   produced at registration/configuration time. It travels through the
//!   crate-wide [`Result`] alias.
//! - [`InvocationError`] is a recovered, dispatch-time failure. It is never
//!   propagated as a `Result`; instead it becomes the outcome value of the
//!   dispatch result it belongs to, so sibling invocations are unaffected.

use std::any::Any;

/// Fatal errors raised while registering handlers or configuring the engine.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Descriptor discovery failed: zero descriptors, an unknown handler
    /// type, or a binding that cannot be resolved. Registration of the
    /// offending handler object fails atomically.
    #[error("validation error: {0}")]
    Validation(String),

    /// Engine misconfiguration, e.g. setting a default strategy that was
    /// never added to the strategy registry.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Captured failure from a single handle invocation.
///
/// Carried as data inside an outcome rather than raised, so one failing
/// handler never interrupts the rest of the dispatch call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InvocationError {
    /// The handler panicked; the payload message is preserved.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// A fallible handler returned an error.
    #[error("handler failed: {0}")]
    Failed(String),

    /// The target callable could not downcast its handler object or event.
    /// Registry keying makes this unreachable in normal operation.
    #[error("type mismatch: expected {expected}")]
    TypeMismatch {
        /// The type the callable was compiled against.
        expected: &'static str,
    },
}

/// Renders a panic payload into a displayable message.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
