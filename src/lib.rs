//! # Dispatch Core
//!
//! In-process event dispatch with pluggable execution strategies.
//!
//! ## Overview
//!
//! Handler objects declare, per type, which event types they accept and how
//! each invocation should run. Registration discovers those declarations
//! through a [`handle::meta::MetadataProvider`] and indexes the handlers by
//! event type; dispatch fans an event out to every matching handle in
//! deterministic order, executing each one through a named
//! [`dispatch::strategy::DispatchStrategy`].
//!
//! Event matching is exact on the payload's runtime type. There is no
//! supertype or trait-based matching: a handle bound to `OrderPlaced` sees
//! `OrderPlaced` events and nothing else.
//!
//! Handler failures are outcomes, not errors. A panicking or fallible handle
//! resolves to [`dispatch::Outcome::Failure`] in its slot of the result list
//! and the fan-out continues. The engine's own `Result`s are reserved for
//! registration and configuration problems.
//!
//! ## Module Organization
//!
//! - [`event`]: type-erased event payloads and their exact-type keys
//! - [`handle`]: descriptors, bound handles, handlers, metadata discovery
//! - [`registry`]: the event-keyed handler registry
//! - [`dispatch`]: the dispatcher, strategies, results, and flow control
//! - [`engine`]: the combined registry-plus-dispatcher facade
//! - [`error`]: engine errors and captured invocation failures
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use dispatch_core::dispatch::strategy::StrategyId;
//! use dispatch_core::engine::DispatchEngine;
//! use dispatch_core::handle::meta::BindingTable;
//! use dispatch_core::handle::HandleDescriptor;
//!
//! struct Mailer;
//!
//! struct SignupCompleted {
//!     user: String,
//! }
//!
//! # async fn example() -> dispatch_core::error::Result<()> {
//! let provider = Arc::new(BindingTable::new().bind::<Mailer>(vec![
//!     HandleDescriptor::of(|_: &Mailer, e: &SignupCompleted| {
//!         format!("welcome, {}", e.user)
//!     })
//!     .with_strategy(StrategyId::ASYNCHRONOUS),
//! ]));
//!
//! let mut engine = DispatchEngine::new(provider);
//! engine.handlers_mut().register(Mailer)?;
//!
//! let results = engine.dispatch(SignupCompleted { user: "ada".into() }).await;
//! for result in &results {
//!     let outcome = result.result().await;
//!     println!("{:?}", outcome);
//! }
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod event;
pub mod handle;
pub mod logging;
pub mod registry;

pub use dispatch::{
    DispatchResult, DispatchResults, DispatchStrategy, DispatchStrategyRegistry, Dispatcher,
    FlowControl, Outcome, StrategyId,
};
pub use engine::DispatchEngine;
pub use error::{DispatchError, InvocationError, Result};
pub use event::{Event, EventKey};
pub use handle::meta::{BindingTable, MetadataProvider};
pub use handle::{Handle, HandleDescriptor, Handler, HandlerId};
pub use registry::HandlerRegistry;
