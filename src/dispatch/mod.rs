//! # Dispatch
//!
//! Event fan-out and the strategies that execute each handle invocation.
//!
//! ## Overview
//!
//! The [`Dispatcher`] walks handlers in caller order and submits each
//! matching handle to a [`strategy::DispatchStrategy`] resolved through the
//! [`strategy::DispatchStrategyRegistry`]. Every submission produces a
//! [`DispatchResult`] whose [`Outcome`] is either settled immediately or
//! pending on a worker. A result can carry a [`FlowControl`] directive to
//! halt the remaining fan-out.

pub mod dispatcher;
pub mod flow;
pub mod result;
pub mod strategy;

pub use dispatcher::Dispatcher;
pub use flow::FlowControl;
pub use result::{DispatchResult, DispatchResults, HandlerValue, Outcome, PendingHandle};
pub use strategy::{
    AsynchronousStrategy, DispatchStrategy, DispatchStrategyRegistry, FixedPoolStrategy,
    HandlerQueuedStrategy, StrategyId, SynchronousStrategy,
};
