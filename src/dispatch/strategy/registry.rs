//! Named strategy collection with fallback-not-failure lookup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::dispatch::strategy::{DispatchStrategy, StrategyId};
use crate::error::{DispatchError, Result};

/// Keyed collection of strategies plus a configured default.
///
/// Lookup never fails: an unset or unknown id silently resolves to the
/// configured default (or an explicitly supplied fallback). Only
/// `set_default` validates its argument.
#[derive(Default)]
pub struct DispatchStrategyRegistry {
    strategies: HashMap<StrategyId, Arc<dyn DispatchStrategy>>,
    default_id: Option<StrategyId>,
}

impl DispatchStrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a strategy under its own id, replacing any previous entry.
    pub fn add(&mut self, strategy: Arc<dyn DispatchStrategy>) -> &mut Self {
        self.strategies.insert(strategy.id(), strategy);
        self
    }

    /// Removes the strategy registered under `id`. Removing the current
    /// default leaves the registry without one.
    pub fn remove(&mut self, id: &StrategyId) -> &mut Self {
        self.strategies.remove(id);
        if self.default_id.as_ref() == Some(id) {
            self.default_id = None;
        }
        self
    }

    /// Makes a previously added strategy the default. Errors when `id` was
    /// never added.
    pub fn set_default(&mut self, id: StrategyId) -> Result<()> {
        if !self.strategies.contains_key(&id) {
            return Err(DispatchError::Configuration(format!(
                "cannot default to unregistered strategy '{id}'; add it first"
            )));
        }
        self.default_id = Some(id);
        Ok(())
    }

    /// Registers `strategy` and makes it the default in one step.
    pub fn set_default_strategy(&mut self, strategy: Arc<dyn DispatchStrategy>) -> &mut Self {
        let id = strategy.id();
        self.add(strategy);
        self.default_id = Some(id);
        self
    }

    /// The configured default strategy, if one is set.
    pub fn default_strategy(&self) -> Option<Arc<dyn DispatchStrategy>> {
        self.default_id
            .as_ref()
            .and_then(|id| self.strategies.get(id).cloned())
    }

    /// Exact lookup with no fallback.
    pub fn lookup(&self, id: &StrategyId) -> Option<Arc<dyn DispatchStrategy>> {
        self.strategies.get(id).cloned()
    }

    /// The strategy for `id`, falling back to the configured default when
    /// `id` is unset or unknown. Never an error.
    pub fn get(&self, id: Option<&StrategyId>) -> Option<Arc<dyn DispatchStrategy>> {
        if let Some(id) = id {
            if let Some(strategy) = self.strategies.get(id) {
                return Some(Arc::clone(strategy));
            }
            debug!(strategy = %id, "unknown strategy id, falling back to default");
        }
        self.default_strategy()
    }

    /// The strategy for `id`, falling back to `fallback` when `id` is unset
    /// or unknown.
    pub fn get_or(
        &self,
        id: Option<&StrategyId>,
        fallback: Arc<dyn DispatchStrategy>,
    ) -> Arc<dyn DispatchStrategy> {
        match id.and_then(|id| self.lookup(id)) {
            Some(strategy) => strategy,
            None => fallback,
        }
    }

    /// Registered strategy count.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
