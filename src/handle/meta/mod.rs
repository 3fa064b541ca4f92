//! # Metadata Provider Seam
//!
//! The engine treats descriptor discovery as an external collaborator: any
//! mechanism that maps a handler object to a list of [`HandleDescriptor`]s
//! can drive registration. The reflective discovery of other runtimes is
//! replaced here by [`BindingTable`], a declarative per-type table populated
//! with typed descriptor constructors.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::dispatch::strategy::StrategyId;
use crate::error::{DispatchError, Result};
use crate::handle::descriptor::HandleDescriptor;
use crate::handle::DynHandler;

pub mod cache;

pub use cache::{ConcurrentMetaCache, MetaCache};

/// Produces the handle descriptors for a handler object.
///
/// Implementations fail with a validation error when the result set would be
/// empty or a declared binding cannot be resolved. Descriptors are
/// per-handler-type, so providers may ignore the instance entirely.
pub trait MetadataProvider: Send + Sync {
    /// Discovers descriptors for `object`, stamping unset strategy ids and
    /// method labels from the supplied defaults.
    fn discover(
        &self,
        object: &DynHandler,
        default_strategy: Option<&StrategyId>,
        default_method: &str,
    ) -> Result<Vec<Arc<HandleDescriptor>>>;
}

/// Declarative metadata provider: an explicit table of descriptor lists
/// keyed by handler type.
#[derive(Default)]
pub struct BindingTable {
    bindings: HashMap<TypeId, TableEntry>,
}

struct TableEntry {
    type_name: &'static str,
    descriptors: Vec<Arc<HandleDescriptor>>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the descriptor list for handler type `H`, replacing any
    /// previous list for that type.
    pub fn bind<H: Send + Sync + 'static>(
        mut self,
        descriptors: impl IntoIterator<Item = HandleDescriptor>,
    ) -> Self {
        let descriptors = descriptors.into_iter().map(Arc::new).collect();
        self.bindings.insert(
            TypeId::of::<H>(),
            TableEntry {
                type_name: std::any::type_name::<H>(),
                descriptors,
            },
        );
        self
    }

    /// Number of handler types with bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl MetadataProvider for BindingTable {
    fn discover(
        &self,
        object: &DynHandler,
        default_strategy: Option<&StrategyId>,
        default_method: &str,
    ) -> Result<Vec<Arc<HandleDescriptor>>> {
        let type_id = object.as_ref().type_id();
        let entry = self.bindings.get(&type_id).ok_or_else(|| {
            DispatchError::Validation(
                "no bindings declared for the handler object's type".to_string(),
            )
        })?;

        if entry.descriptors.is_empty() {
            return Err(DispatchError::Validation(format!(
                "empty binding list declared for {}",
                entry.type_name
            )));
        }

        Ok(entry
            .descriptors
            .iter()
            .map(|descriptor| descriptor.resolved(default_strategy, default_method))
            .collect())
    }
}
