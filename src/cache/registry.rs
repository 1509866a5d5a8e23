//! Bidirectional tag registry.
//!
//! Tracks which cache keys are registered under which tags so an invalidation
//! can find every entry a tag covers, and an evicted entry can be forgotten.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::keys::{CacheKey, Tag};
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::registry";

/// Both maps live behind one lock so they cannot drift apart.
#[derive(Default)]
struct Maps {
    tag_to_keys: HashMap<Tag, HashSet<CacheKey>>,
    key_to_tags: HashMap<CacheKey, HashSet<Tag>>,
}

#[derive(Default)]
pub struct CacheRegistry {
    maps: RwLock<Maps>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` under `tags`, replacing any earlier registration.
    pub fn register(&self, key: CacheKey, tags: &[Tag]) {
        let mut maps = rw_write(&self.maps, SOURCE, "register");
        detach(&mut maps, &key);

        for tag in tags {
            maps.tag_to_keys
                .entry(tag.clone())
                .or_default()
                .insert(key.clone());
        }
        maps.key_to_tags.insert(key, tags.iter().cloned().collect());
    }

    pub fn keys_for_tag(&self, tag: &Tag) -> HashSet<CacheKey> {
        rw_read(&self.maps, SOURCE, "keys_for_tag")
            .tag_to_keys
            .get(tag)
            .cloned()
            .unwrap_or_default()
    }

    pub fn tags_for_key(&self, key: &CacheKey) -> HashSet<Tag> {
        rw_read(&self.maps, SOURCE, "tags_for_key")
            .key_to_tags
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Forget `key`, e.g. after LRU eviction or expiry.
    pub fn unregister(&self, key: &CacheKey) {
        let mut maps = rw_write(&self.maps, SOURCE, "unregister");
        detach(&mut maps, key);
    }

    /// Remove every key registered under `tag` and return them.
    ///
    /// The keys are detached from all their other tags too, since the entries
    /// they name are about to be dropped.
    pub fn take_tag(&self, tag: &Tag) -> HashSet<CacheKey> {
        let mut maps = rw_write(&self.maps, SOURCE, "take_tag");
        let keys = maps.tag_to_keys.remove(tag).unwrap_or_default();
        for key in &keys {
            detach(&mut maps, key);
        }
        keys
    }

    pub fn clear(&self) {
        self.clear_then(|| {});
    }

    /// Clear, then run `then` before releasing the lock, so no key can be
    /// registered between the two steps.
    pub fn clear_then(&self, then: impl FnOnce()) {
        let mut maps = rw_write(&self.maps, SOURCE, "clear");
        maps.tag_to_keys.clear();
        maps.key_to_tags.clear();
        then();
    }

    pub fn tag_count(&self) -> usize {
        rw_read(&self.maps, SOURCE, "tag_count").tag_to_keys.len()
    }

    pub fn key_count(&self) -> usize {
        rw_read(&self.maps, SOURCE, "key_count").key_to_tags.len()
    }
}

fn detach(maps: &mut Maps, key: &CacheKey) {
    let Some(tags) = maps.key_to_tags.remove(key) else {
        return;
    };
    for tag in tags {
        if let Some(keys) = maps.tag_to_keys.get_mut(&tag) {
            keys.remove(key);
            if keys.is_empty() {
                maps.tag_to_keys.remove(&tag);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;
    use uuid::Uuid;

    use super::*;
    use crate::cache::keys::CacheSpec;

    fn register(registry: &CacheRegistry, spec: &CacheSpec) {
        registry.register(spec.key.clone(), &spec.tags);
    }

    #[test]
    fn register_and_lookup() {
        let registry = CacheRegistry::new();
        let spec = CacheSpec::overlay("neo");
        register(&registry, &spec);

        assert!(registry.keys_for_tag(&Tag::overlay("neo")).contains(&spec.key));
        assert!(
            registry
                .tags_for_key(&spec.key)
                .contains(&Tag::category("overlay"))
        );
    }

    #[test]
    fn category_tag_spans_resources() {
        let registry = CacheRegistry::new();
        let id = Uuid::new_v4();
        let this_week = CacheSpec::schedule(id, date!(2024 - 05 - 13));
        let other_user = CacheSpec::schedule(Uuid::new_v4(), date!(2024 - 05 - 13));
        register(&registry, &this_week);
        register(&registry, &other_user);

        assert_eq!(registry.keys_for_tag(&Tag::schedule(id)).len(), 1);
        assert_eq!(registry.keys_for_tag(&Tag::category("schedule")).len(), 2);
    }

    #[test]
    fn take_tag_detaches_keys_from_other_tags() {
        let registry = CacheRegistry::new();
        let spec = CacheSpec::overlay("neo");
        register(&registry, &spec);

        let taken = registry.take_tag(&Tag::overlay("neo"));
        assert!(taken.contains(&spec.key));
        assert_eq!(registry.key_count(), 0);
        assert_eq!(registry.tag_count(), 0);
    }

    #[test]
    fn unregister_cleans_up_mappings() {
        let registry = CacheRegistry::new();
        let spec = CacheSpec::profile("neo");
        register(&registry, &spec);
        assert_eq!(registry.key_count(), 1);
        assert_eq!(registry.tag_count(), 2);

        registry.unregister(&spec.key);
        assert_eq!(registry.key_count(), 0);
        assert_eq!(registry.tag_count(), 0);
    }

    #[test]
    fn re_registering_replaces_tags() {
        let registry = CacheRegistry::new();
        let spec = CacheSpec::profile("neo");
        registry.register(spec.key.clone(), &[Tag::category("a")]);
        registry.register(spec.key.clone(), &[Tag::category("b")]);

        assert!(registry.keys_for_tag(&Tag::category("a")).is_empty());
        assert_eq!(registry.keys_for_tag(&Tag::category("b")).len(), 1);
    }

    #[test]
    fn clear_removes_all_mappings() {
        let registry = CacheRegistry::new();
        register(&registry, &CacheSpec::search(crate::domain::types::SearchKind::Game, "doom"));
        registry.clear();
        assert_eq!(registry.key_count(), 0);
        assert_eq!(registry.tag_count(), 0);
    }
}
