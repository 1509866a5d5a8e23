//! Cache configuration.
//!
//! Controls the read-through cache via the `[cache]` section of the settings.

use std::num::NonZeroUsize;
use std::time::Duration;

use super::keys::CacheClass;

const DEFAULT_CAPACITY: usize = 10_000;
const DEFAULT_CONSUME_BATCH_LIMIT: usize = 100;

const DEFAULT_PROFILE_TTL_SECS: u64 = 3_600;
const DEFAULT_OVERLAY_TTL_SECS: u64 = 600;
const DEFAULT_SCHEDULE_TTL_SECS: u64 = 600;
const DEFAULT_WATCHLIST_TTL_SECS: u64 = 600;
const DEFAULT_FOLLOWS_TTL_SECS: u64 = 600;
const DEFAULT_SPONSORS_TTL_SECS: u64 = 3_600;
const DEFAULT_SOCIALS_TTL_SECS: u64 = 3_600;
const DEFAULT_TWITCH_LIVE_TTL_SECS: u64 = 60;
const DEFAULT_SEARCH_TTL_SECS: u64 = 86_400;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When false every read goes straight to its loader and nothing is stored.
    pub enabled: bool,
    /// Maximum number of entries before LRU eviction.
    pub capacity: usize,
    /// Maximum events per consumption batch.
    pub consume_batch_limit: usize,
    pub profile_ttl_secs: u64,
    pub overlay_ttl_secs: u64,
    pub schedule_ttl_secs: u64,
    pub watchlist_ttl_secs: u64,
    pub follows_ttl_secs: u64,
    pub sponsors_ttl_secs: u64,
    pub socials_ttl_secs: u64,
    pub twitch_live_ttl_secs: u64,
    pub search_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
            consume_batch_limit: DEFAULT_CONSUME_BATCH_LIMIT,
            profile_ttl_secs: DEFAULT_PROFILE_TTL_SECS,
            overlay_ttl_secs: DEFAULT_OVERLAY_TTL_SECS,
            schedule_ttl_secs: DEFAULT_SCHEDULE_TTL_SECS,
            watchlist_ttl_secs: DEFAULT_WATCHLIST_TTL_SECS,
            follows_ttl_secs: DEFAULT_FOLLOWS_TTL_SECS,
            sponsors_ttl_secs: DEFAULT_SPONSORS_TTL_SECS,
            socials_ttl_secs: DEFAULT_SOCIALS_TTL_SECS,
            twitch_live_ttl_secs: DEFAULT_TWITCH_LIVE_TTL_SECS,
            search_ttl_secs: DEFAULT_SEARCH_TTL_SECS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            capacity: settings.capacity.get(),
            consume_batch_limit: settings.consume_batch_limit.get(),
            profile_ttl_secs: settings.profile_ttl.as_secs(),
            overlay_ttl_secs: settings.overlay_ttl.as_secs(),
            schedule_ttl_secs: settings.schedule_ttl.as_secs(),
            watchlist_ttl_secs: settings.watchlist_ttl.as_secs(),
            follows_ttl_secs: settings.follows_ttl.as_secs(),
            sponsors_ttl_secs: settings.sponsors_ttl.as_secs(),
            socials_ttl_secs: settings.socials_ttl.as_secs(),
            twitch_live_ttl_secs: settings.twitch_live_ttl.as_secs(),
            search_ttl_secs: settings.search_ttl.as_secs(),
        }
    }
}

impl CacheConfig {
    /// Capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn ttl_for(&self, class: CacheClass) -> Duration {
        let secs = match class {
            CacheClass::User | CacheClass::Profile => self.profile_ttl_secs,
            CacheClass::Overlay => self.overlay_ttl_secs,
            CacheClass::Schedule => self.schedule_ttl_secs,
            CacheClass::Watchlist => self.watchlist_ttl_secs,
            CacheClass::Follows => self.follows_ttl_secs,
            CacheClass::Sponsors => self.sponsors_ttl_secs,
            CacheClass::Socials => self.socials_ttl_secs,
            CacheClass::TwitchLive => self.twitch_live_ttl_secs,
            CacheClass::Search => self.search_ttl_secs,
        };
        Duration::from_secs(secs)
    }
}
