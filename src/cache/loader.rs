//! Read-through loader.
//!
//! Wraps a fetch so repeated reads of the same [`CacheSpec`] share one result
//! until it expires or one of its tags is invalidated. Concurrent misses on
//! one key wait for a single fetch. A failing fetch stores nothing and its
//! error is returned as-is.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use metrics::counter;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use super::config::CacheConfig;
use super::keys::{CacheKey, CacheSpec};
use super::lock::mutex_lock;
use super::registry::CacheRegistry;
use super::store::{CacheStore, Lookup};

const SOURCE: &str = "cache::loader";

const METRIC_CACHE_HIT: &str = "creatorhub_cache_hit_total";
const METRIC_CACHE_MISS: &str = "creatorhub_cache_miss_total";
const METRIC_CACHE_EVICT: &str = "creatorhub_cache_evict_total";

pub struct CachedLoader {
    config: CacheConfig,
    store: Arc<CacheStore>,
    registry: Arc<CacheRegistry>,
    in_flight: Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>,
}

impl CachedLoader {
    pub fn new(config: CacheConfig, store: Arc<CacheStore>, registry: Arc<CacheRegistry>) -> Self {
        Self {
            config,
            store,
            registry,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    fn key_lock(&self, key: &CacheKey) -> Arc<AsyncMutex<()>> {
        mutex_lock(&self.in_flight, SOURCE, "key_lock")
            .entry(key.clone())
            .or_default()
            .clone()
    }

    /// Drop the key's lock once no other caller holds a handle to it.
    fn release_key_lock(&self, key: &CacheKey, lock: &Arc<AsyncMutex<()>>) {
        let mut in_flight = mutex_lock(&self.in_flight, SOURCE, "release_key_lock");
        if Arc::strong_count(lock) <= 2 {
            in_flight.remove(key);
        }
    }

    fn lookup<T>(&self, spec: &CacheSpec) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        match self.store.get::<T>(&spec.key, Instant::now()) {
            Lookup::Hit(value) => {
                counter!(METRIC_CACHE_HIT, "class" => spec.class.as_str()).increment(1);
                Some(value)
            }
            Lookup::Expired => {
                self.registry.unregister(&spec.key);
                debug!(target = "creatorhub::cache", key = %spec.key, "Cache entry expired");
                None
            }
            Lookup::Miss => None,
        }
    }

    pub async fn get_or_load<T, E, F, Fut>(&self, spec: &CacheSpec, load: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.config.enabled {
            return load().await;
        }

        if let Some(value) = self.lookup(spec) {
            return Ok(value);
        }

        let key_lock = self.key_lock(&spec.key);
        let result = {
            let _guard = key_lock.lock().await;
            match self.lookup(spec) {
                Some(value) => Ok(value),
                None => self.load_and_store(spec, load).await,
            }
        };
        self.release_key_lock(&spec.key, &key_lock);
        result
    }

    async fn load_and_store<T, E, F, Fut>(&self, spec: &CacheSpec, load: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        counter!(METRIC_CACHE_MISS, "class" => spec.class.as_str()).increment(1);

        let generation = self.store.generation();
        let value = load().await?;
        if self.store.generation() != generation {
            debug!(target = "creatorhub::cache", key = %spec.key, "Skipping store: invalidated during load");
            return Ok(value);
        }

        // Register before storing so a concurrent invalidation either sees the
        // registration or is seen by the re-check below.
        self.registry.register(spec.key.clone(), &spec.tags);
        let ttl = self.config.ttl_for(spec.class);
        if let Some(evicted) = self
            .store
            .put(spec.key.clone(), value.clone(), ttl, Instant::now())
        {
            self.registry.unregister(&evicted);
            counter!(METRIC_CACHE_EVICT).increment(1);
        }
        if self.store.generation() != generation {
            self.store.remove(&spec.key);
            self.registry.unregister(&spec.key);
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn loader(config: CacheConfig) -> CachedLoader {
        let store = Arc::new(CacheStore::new(&config));
        CachedLoader::new(config, store, Arc::new(CacheRegistry::new()))
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let loader = loader(CacheConfig::default());
        let calls = AtomicUsize::new(0);
        let spec = CacheSpec::profile("neo");

        for _ in 0..3 {
            let value: Result<String, ()> = loader
                .get_or_load(&spec, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("snapshot".to_string())
                })
                .await;
            assert_eq!(value.unwrap(), "snapshot");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_load() {
        let loader = loader(CacheConfig::default());
        let calls = AtomicUsize::new(0);
        let spec = CacheSpec::profile("neo");

        let read = || {
            loader.get_or_load(&spec, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                Ok::<_, ()>("snapshot".to_string())
            })
        };
        let (first, second) = tokio::join!(read(), read());

        assert_eq!(first.unwrap(), "snapshot");
        assert_eq!(second.unwrap(), "snapshot");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(loader.in_flight.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let loader = loader(CacheConfig::default());
        let spec = CacheSpec::overlay("neo");

        let first: Result<u32, &str> = loader.get_or_load(&spec, || async { Err("boom") }).await;
        assert_eq!(first, Err("boom"));

        let second: Result<u32, &str> = loader.get_or_load(&spec, || async { Ok(7) }).await;
        assert_eq!(second, Ok(7));
    }

    #[tokio::test]
    async fn zero_ttl_always_reloads() {
        let loader = loader(CacheConfig {
            overlay_ttl_secs: 0,
            ..Default::default()
        });
        let calls = AtomicUsize::new(0);
        let spec = CacheSpec::overlay("neo");

        for _ in 0..2 {
            let _: Result<u8, ()> = loader
                .get_or_load(&spec, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                })
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn disabled_cache_always_loads() {
        let loader = loader(CacheConfig {
            enabled: false,
            ..Default::default()
        });
        let calls = AtomicUsize::new(0);
        let spec = CacheSpec::profile("neo");

        for _ in 0..2 {
            let _: Result<u8, ()> = loader
                .get_or_load(&spec, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                })
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidation_during_load_skips_store() {
        let loader = loader(CacheConfig::default());
        let spec = CacheSpec::profile("neo");
        let store = loader.store.clone();

        let _: Result<u8, ()> = loader
            .get_or_load(&spec, || async move {
                store.bump_generation();
                Ok(1)
            })
            .await;
        assert!(loader.store.is_empty());
    }
}
