//! Tag-scoped read-through cache.
//!
//! - **Keys and tags**: [`CacheSpec`] names an entry, the tags it is registered
//!   under, and its TTL class.
//! - **Read side**: [`CachedLoader::get_or_load`] serves fresh entries and runs
//!   the fetch on a miss.
//! - **Write side**: [`CacheTrigger`] publishes what changed; the planner maps
//!   each event to tags and the consumer drops every entry under them.
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 10000
//! overlay_ttl_seconds = 600
//! ```

mod config;
mod consumer;
mod events;
mod keys;
mod loader;
mod lock;
mod planner;
mod registry;
mod state;
mod store;
mod trigger;

pub use config::CacheConfig;
pub use consumer::CacheConsumer;
pub use events::{CacheEvent, Epoch, EventKind, EventQueue};
pub use keys::{CacheClass, CacheKey, CacheSpec, Tag};
pub use loader::CachedLoader;
pub use planner::ConsumptionPlan;
pub use registry::CacheRegistry;
pub use state::CacheState;
pub use store::{CacheStore, Lookup};
pub use trigger::CacheTrigger;
