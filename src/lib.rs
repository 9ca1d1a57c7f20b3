//! kscdb: coordination primitives over a compare-and-swap key-value store.
//!
//! [`Kscdb`] bundles the primitives around one injected backend:
//!
//! - [`KeyValueMap`] - plain get/set/delete and prefix listing
//! - [`DistributedLock`] - token-based mutual exclusion
//! - [`IdAllocator`] - unique increasing IDs per named counter
//! - [`QueueManager`] - named FIFO queues with at-most-once delivery
//! - [`CapabilityRegistry`] - dispatch of encoded remote invocations
//!
//! Any type implementing [`KeyValueStore`] can serve as the backend; the
//! primitives need only single-key compare-and-swap and ordered prefix scans.
//!
//! ```ignore
//! use kscdb::{Kscdb, KscdbConfig};
//! use kscdb_testing::DeterministicKeyValueStore;
//!
//! let db = Kscdb::new(DeterministicKeyValueStore::new(), KscdbConfig::load_with_layers()?);
//! let order_id = db.ids().next("orders").await?;
//! db.queue().enqueue("fulfilment", order_id.to_string().into_bytes()).await?;
//! ```

pub mod config;
mod map;

use std::sync::Arc;

pub use config::ConfigError;
pub use config::KscdbConfig;
pub use kscdb_coordination::CoordinationError;
pub use kscdb_coordination::DequeuedItem;
pub use kscdb_coordination::DistributedLock;
pub use kscdb_coordination::IdAllocator;
pub use kscdb_coordination::LockToken;
pub use kscdb_coordination::QueueManager;
pub use kscdb_kv_types::KeyList;
pub use kscdb_kv_types::KeyValueStoreError;
pub use kscdb_plugin_api::Capability;
pub use kscdb_plugin_api::CapabilityRegistry;
pub use kscdb_plugin_api::FnCapability;
pub use kscdb_plugin_api::PluginError;
pub use kscdb_plugin_api::RemoteInvocationRequest;
pub use kscdb_traits::KeyOrderedStore;
pub use kscdb_traits::KeyValueStore;
pub use map::KeyValueMap;

/// Handle over one backend. Cheap to share behind an `Arc`.
pub struct Kscdb<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
    config: KscdbConfig,
    map: KeyValueMap<S>,
    lock: DistributedLock<S>,
    ids: IdAllocator<S>,
    queue: QueueManager<S>,
    capabilities: CapabilityRegistry,
}

impl<S: KeyValueStore + ?Sized + 'static> Kscdb<S> {
    /// Build every primitive over `store` with `config`.
    ///
    /// The configuration is used as given; call [`KscdbConfig::validate`]
    /// first when it comes from an untrusted source.
    pub fn new(store: Arc<S>, config: KscdbConfig) -> Self {
        Self {
            map: KeyValueMap::new(Arc::clone(&store)),
            lock: DistributedLock::new(Arc::clone(&store), config.lock.clone()),
            ids: IdAllocator::new(Arc::clone(&store), config.lock.clone(), config.ids.clone()),
            queue: QueueManager::new(Arc::clone(&store), config.lock.clone(), config.queue.clone()),
            capabilities: CapabilityRegistry::new(),
            store,
            config,
        }
    }

    /// Replace the capability registry.
    pub fn with_capabilities(mut self, registry: CapabilityRegistry) -> Self {
        self.capabilities = registry;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &KscdbConfig {
        &self.config
    }

    pub fn map(&self) -> &KeyValueMap<S> {
        &self.map
    }

    pub fn lock(&self) -> &DistributedLock<S> {
        &self.lock
    }

    pub fn ids(&self) -> &IdAllocator<S> {
        &self.ids
    }

    pub fn queue(&self) -> &QueueManager<S> {
        &self.queue
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    pub fn capabilities_mut(&mut self) -> &mut CapabilityRegistry {
        &mut self.capabilities
    }

    /// Decode an encoded [`RemoteInvocationRequest`] and dispatch it.
    pub async fn func(&self, payload: &[u8]) -> Result<Vec<u8>, PluginError> {
        self.capabilities.invoke_encoded(payload).await
    }
}
