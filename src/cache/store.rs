//! Entry storage for the read-through cache.
//!
//! Values of any cloneable type are stored type-erased behind an `Arc` and
//! recovered by downcast on read. Each entry carries its own expiry; an
//! expired entry is dropped on the read that finds it.

use std::any::Any;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

type Value = std::sync::Arc<dyn Any + Send + Sync>;

struct Entry {
    value: Value,
    expires_at: Instant,
}

/// Result of a lookup that distinguishes expiry from absence.
pub enum Lookup<T> {
    Hit(T),
    Expired,
    Miss,
}

pub struct CacheStore {
    entries: RwLock<LruCache<CacheKey, Entry>>,
    /// Bumped by every invalidation; a load that started under an older
    /// generation must not store its result.
    generation: AtomicU64,
}

impl CacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
            generation: AtomicU64::new(0),
        }
    }

    pub fn get<T>(&self, key: &CacheKey, now: Instant) -> Lookup<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let Some(entry) = entries.get(key) else {
            return Lookup::Miss;
        };
        if entry.expires_at <= now {
            entries.pop(key);
            return Lookup::Expired;
        }
        match entry.value.downcast_ref::<T>() {
            Some(value) => Lookup::Hit(value.clone()),
            None => Lookup::Miss,
        }
    }

    /// Store `value` under `key`; returns the key evicted to make room, if any.
    pub fn put<T>(&self, key: CacheKey, value: T, ttl: Duration, now: Instant) -> Option<CacheKey>
    where
        T: Send + Sync + 'static,
    {
        let entry = Entry {
            value: std::sync::Arc::new(value),
            expires_at: now + ttl,
        };
        rw_write(&self.entries, SOURCE, "put")
            .push(key.clone(), entry)
            .and_then(|(evicted, _)| (evicted != key).then_some(evicted))
    }

    pub fn remove(&self, key: &CacheKey) -> bool {
        rw_write(&self.entries, SOURCE, "remove").pop(key).is_some()
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
        self.bump_generation();
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;
    use crate::cache::keys::CacheSpec;

    fn key(name: &str) -> CacheKey {
        CacheSpec::profile(name).key
    }

    #[test]
    fn stores_and_returns_typed_values() {
        let store = CacheStore::new(&CacheConfig::default());
        let now = Instant::now();
        store.put(key("neo"), vec![1_u32, 2, 3], Duration::from_secs(10), now);

        match store.get::<Vec<u32>>(&key("neo"), now) {
            Lookup::Hit(value) => assert_eq!(value, vec![1, 2, 3]),
            _ => panic!("expected hit"),
        }
        assert!(matches!(store.get::<String>(&key("neo"), now), Lookup::Miss));
    }

    #[test]
    fn expired_entries_are_dropped() {
        let store = CacheStore::new(&CacheConfig::default());
        let now = Instant::now();
        store.put(key("neo"), 1_u8, Duration::from_secs(5), now);

        let later = now + Duration::from_secs(5);
        assert!(matches!(store.get::<u8>(&key("neo"), later), Lookup::Expired));
        assert!(store.is_empty());
    }

    #[test]
    fn lru_eviction_reports_evicted_key() {
        let config = CacheConfig {
            capacity: 2,
            ..Default::default()
        };
        let store = CacheStore::new(&config);
        let now = Instant::now();
        let ttl = Duration::from_secs(60);

        assert!(store.put(key("a"), 1_u8, ttl, now).is_none());
        assert!(store.put(key("b"), 2_u8, ttl, now).is_none());
        // Replacing an existing key is not an eviction.
        assert!(store.put(key("b"), 3_u8, ttl, now).is_none());
        assert_eq!(store.put(key("c"), 4_u8, ttl, now), Some(key("a")));
    }

    #[test]
    fn clear_bumps_generation() {
        let store = CacheStore::new(&CacheConfig::default());
        let before = store.generation();
        store.clear();
        assert!(store.generation() > before);
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let store = CacheStore::new(&CacheConfig::default());

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store.entries.write().expect("entries lock");
            panic!("poison entries lock");
        }));

        store.put(key("neo"), 1_u8, Duration::from_secs(1), Instant::now());
        assert_eq!(store.len(), 1);
    }
}
