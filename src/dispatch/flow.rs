//! Flow control for the dispatch loop.

/// Directive applied after each handle executes, controlling whether the
/// dispatch call keeps iterating.
///
/// Strategies attach this to the result they return; the dispatcher reads it
/// once the result has been appended. `Stop` exhausts both the handler and
/// handle cursors for the current call only. Work already handed to a
/// strategy is not cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlowControl {
    /// Proceed to the next handle or handler.
    #[default]
    Continue,
    /// Terminate all further dispatch for this call.
    Stop,
}

impl FlowControl {
    pub fn is_stop(self) -> bool {
        matches!(self, FlowControl::Stop)
    }
}
