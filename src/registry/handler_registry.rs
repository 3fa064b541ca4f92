//! # Handler Registry
//!
//! Event-type-keyed index of registered handlers.
//!
//! ## Overview
//!
//! Registration runs descriptor discovery through the configured
//! [`MetadataProvider`], stamps registry defaults onto unset descriptor
//! fields, and indexes the resulting [`Handler`] under every event type it
//! accepts. Lookup by event is the dispatch hot path and returns the bucket
//! slice directly.
//!
//! Registration of one object is atomic: discovery or validation failure
//! leaves the registry exactly as it was. Bulk registration is atomic per
//! object only; failures are aggregated and the remaining objects still
//! register.
//!
//! An optional [`MetaCache`] keyed by handler type short-circuits repeated
//! discovery for further instances of an already seen type.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::dispatch::strategy::StrategyId;
use crate::error::{DispatchError, Result};
use crate::event::{Event, EventKey};
use crate::handle::meta::{ConcurrentMetaCache, MetaCache, MetadataProvider};
use crate::handle::{DynHandler, HandleDescriptor, Handler, HandlerId};

/// Fallback method label stamped onto descriptors that declare none.
pub const DEFAULT_METHOD: &str = "handle";

/// Registry of handler objects, indexed by the event types they accept.
pub struct HandlerRegistry {
    provider: Arc<dyn MetadataProvider>,
    meta_cache: Option<Arc<dyn MetaCache>>,
    default_strategy: Option<StrategyId>,
    default_method: String,
    buckets: HashMap<EventKey, Vec<Arc<Handler>>>,
}

impl HandlerRegistry {
    /// Creates an empty registry whose discovery runs through `provider`.
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            provider,
            meta_cache: None,
            default_strategy: None,
            default_method: DEFAULT_METHOD.to_string(),
            buckets: HashMap::new(),
        }
    }

    /// Sets the strategy id stamped onto descriptors that declare none.
    pub fn with_default_strategy(mut self, strategy: StrategyId) -> Self {
        self.default_strategy = Some(strategy);
        self
    }

    /// Sets the method label stamped onto descriptors that declare none.
    pub fn with_default_method(mut self, method: impl Into<String>) -> Self {
        self.default_method = method.into();
        self
    }

    pub fn default_strategy(&self) -> Option<&StrategyId> {
        self.default_strategy.as_ref()
    }

    pub fn default_method(&self) -> &str {
        &self.default_method
    }

    /// Turns on descriptor caching with the default concurrent cache.
    pub fn enable_meta_caching(&mut self) {
        self.enable_meta_caching_with(Arc::new(ConcurrentMetaCache::new()));
    }

    /// Turns on descriptor caching backed by `cache`. A previously installed
    /// cache is cleared before being replaced.
    pub fn enable_meta_caching_with(&mut self, cache: Arc<dyn MetaCache>) {
        if let Some(previous) = self.meta_cache_take() {
            previous.clear();
        }
        self.meta_cache = Some(cache);
    }

    /// Turns off descriptor caching, clearing the installed cache.
    pub fn disable_meta_caching(&mut self) {
        if let Some(cache) = self.meta_cache_take() {
            cache.clear();
        }
    }

    pub fn meta_caching_enabled(&self) -> bool {
        self.meta_cache.is_some()
    }

    fn meta_cache_take(&mut self) -> Option<Arc<dyn MetaCache>> {
        self.meta_cache.take()
    }

    /// Wraps `handler` and registers it, returning the shared object so the
    /// caller can later [`remove`](Self::remove) it.
    pub fn register<H: Send + Sync + 'static>(&mut self, handler: H) -> Result<DynHandler> {
        let object: DynHandler = Arc::new(handler);
        self.add(Arc::clone(&object))?;
        Ok(object)
    }

    /// Registers a handler object.
    ///
    /// Discovery failure leaves the registry unchanged. Registering an object
    /// that is already present replaces its previous registration.
    pub fn add(&mut self, object: DynHandler) -> Result<()> {
        let descriptors = self.descriptors_for(&object)?;
        let handler = Arc::new(Handler::new(Arc::clone(&object), &descriptors)?);

        // Same-object re-registration replaces the prior entry.
        self.remove(&object);

        debug!(
            handler = %handler.id(),
            handles = handler.handle_count(),
            "registered handler"
        );
        for key in handler.event_keys() {
            self.buckets
                .entry(*key)
                .or_default()
                .push(Arc::clone(&handler));
        }
        Ok(())
    }

    /// Registers each object in turn. Failures are collected into one
    /// validation error; objects that validated are registered regardless.
    pub fn add_all(&mut self, objects: impl IntoIterator<Item = DynHandler>) -> Result<()> {
        let mut failures = Vec::new();
        for object in objects {
            if let Err(err) = self.add(object) {
                failures.push(err.to_string());
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::Validation(format!(
                "{} handler object(s) failed to register: {}",
                failures.len(),
                failures.join("; ")
            )))
        }
    }

    /// Unregisters the handler wrapping exactly `object`. Returns whether a
    /// registration was removed.
    pub fn remove(&mut self, object: &DynHandler) -> bool {
        let mut removed = false;
        self.buckets.retain(|_, bucket| {
            bucket.retain(|handler| {
                let matches = Arc::ptr_eq(handler.object(), object);
                removed |= matches;
                !matches
            });
            !bucket.is_empty()
        });
        if removed {
            trace!("unregistered handler object");
        }
        removed
    }

    /// Unregisters every handler whose object is of type `H`. Returns the
    /// number of handlers removed.
    pub fn remove_type<H: Send + Sync + 'static>(&mut self) -> usize {
        let target = TypeId::of::<H>();
        let mut removed: Vec<HandlerId> = Vec::new();
        self.buckets.retain(|_, bucket| {
            bucket.retain(|handler| {
                let matches = handler.object().as_ref().type_id() == target;
                if matches && !removed.contains(&handler.id()) {
                    removed.push(handler.id());
                }
                !matches
            });
            !bucket.is_empty()
        });
        removed.len()
    }

    /// The registered handlers accepting `event`, in registration order.
    pub fn get(&self, event: &Event) -> &[Arc<Handler>] {
        self.buckets.get(event.key()).map_or(&[], Vec::as_slice)
    }

    /// The handlers registered under `key`, in registration order.
    pub fn get_by_key(&self, key: &EventKey) -> &[Arc<Handler>] {
        self.buckets.get(key).map_or(&[], Vec::as_slice)
    }

    /// Every distinct registered handler.
    pub fn all(&self) -> Vec<Arc<Handler>> {
        let mut seen: Vec<HandlerId> = Vec::new();
        let mut handlers = Vec::new();
        for bucket in self.buckets.values() {
            for handler in bucket {
                if !seen.contains(&handler.id()) {
                    seen.push(handler.id());
                    handlers.push(Arc::clone(handler));
                }
            }
        }
        handlers
    }

    /// Number of distinct registered handlers.
    pub fn len(&self) -> usize {
        self.all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Discovers the descriptors for `object`, consulting the cache when one
    /// is installed. Cache hits skip the provider entirely.
    fn descriptors_for(&self, object: &DynHandler) -> Result<Vec<Arc<HandleDescriptor>>> {
        let type_id = object.as_ref().type_id();
        if let Some(cache) = &self.meta_cache {
            if let Some(descriptors) = cache.get(&type_id) {
                trace!("descriptor cache hit");
                return Ok(descriptors);
            }
        }

        let descriptors = self.provider.discover(
            object,
            self.default_strategy.as_ref(),
            &self.default_method,
        )?;
        if let Some(cache) = &self.meta_cache {
            cache.put(type_id, descriptors.clone());
        }
        Ok(descriptors)
    }
}
