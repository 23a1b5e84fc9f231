//! Adapter registry
//!
//! Capability-lookup table from [`AdapterKind`] to adapter instance, built
//! explicitly at startup. Dispatch goes through the closed enum, so a new
//! provider cannot be wired in by string alone.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AdapterError, AdapterResult};
use crate::traits::AdapterOperations;
use crate::types::AdapterKind;

/// Registry of adapter instances, keyed by kind.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<AdapterKind, Arc<dyn AdapterOperations>>,
}

impl AdapterRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> AdapterRegistryBuilder {
        AdapterRegistryBuilder {
            adapters: HashMap::new(),
        }
    }

    /// Get the adapter for a kind.
    pub fn get(&self, kind: AdapterKind) -> AdapterResult<Arc<dyn AdapterOperations>> {
        self.adapters.get(&kind).cloned().ok_or_else(|| {
            AdapterError::sync("dispatch", format!("no adapter registered for '{kind}'"))
        })
    }

    /// The kinds with a registered adapter.
    pub fn kinds(&self) -> impl Iterator<Item = AdapterKind> + '_ {
        self.adapters.keys().copied()
    }

    /// Number of registered adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// Builder for [`AdapterRegistry`].
pub struct AdapterRegistryBuilder {
    adapters: HashMap<AdapterKind, Arc<dyn AdapterOperations>>,
}

impl AdapterRegistryBuilder {
    /// Register an adapter under its own kind. The last registration for a
    /// kind wins.
    #[must_use]
    pub fn register(mut self, adapter: Arc<dyn AdapterOperations>) -> Self {
        self.adapters.insert(adapter.kind(), adapter);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> AdapterRegistry {
        AdapterRegistry {
            adapters: self.adapters,
        }
    }
}
