use std::sync::Arc;

use super::config::CacheConfig;
use super::consumer::CacheConsumer;
use super::events::EventQueue;
use super::loader::CachedLoader;
use super::registry::CacheRegistry;
use super::store::CacheStore;
use super::trigger::CacheTrigger;

/// Shared cache handles: the read side and the write side over one store.
#[derive(Clone)]
pub struct CacheState {
    pub loader: Arc<CachedLoader>,
    pub trigger: Arc<CacheTrigger>,
}

impl CacheState {
    pub fn new(config: CacheConfig) -> Self {
        let store = Arc::new(CacheStore::new(&config));
        let registry = Arc::new(CacheRegistry::new());
        let queue = Arc::new(EventQueue::new());
        let consumer = Arc::new(CacheConsumer::new(
            config.clone(),
            store.clone(),
            registry.clone(),
            queue.clone(),
        ));

        Self {
            loader: Arc::new(CachedLoader::new(config.clone(), store, registry)),
            trigger: Arc::new(CacheTrigger::new(config, queue, consumer)),
        }
    }
}
