//! # Handle Data Model
//!
//! The handler/handle layer of the dispatch engine:
//!
//! - [`HandleDescriptor`]: immutable binding of an event type to a callable
//!   and a strategy id, created once per handler-object type.
//! - [`Handle`]: a bound, invokable (handler, descriptor) pair.
//! - [`Handler`]: a registered handler object plus its event-type -> handle
//!   index.
//! - [`meta`]: the metadata-provider seam and the optional descriptor cache.

use std::any::Any;
use std::sync::Arc;

pub mod descriptor;
#[allow(clippy::module_inception)]
pub mod handle;
pub mod handler;
pub mod meta;

pub use descriptor::{HandleDescriptor, TargetFn};
pub use handle::{Handle, HandlerRef};
pub use handler::{Handler, HandlerId};

/// A registered handler object, type-erased and shareable.
pub type DynHandler = Arc<dyn Any + Send + Sync>;
