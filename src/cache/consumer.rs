//! Cache consumer: drains events, plans, and drops the affected entries.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, info};
use uuid::Uuid;

use super::config::CacheConfig;
use super::events::EventQueue;
use super::planner::ConsumptionPlan;
use super::registry::CacheRegistry;
use super::store::CacheStore;

const METRIC_CACHE_CONSUME_MS: &str = "creatorhub_cache_consume_ms";
const METRIC_CACHE_INVALIDATED: &str = "creatorhub_cache_invalidated_total";

pub struct CacheConsumer {
    config: CacheConfig,
    store: Arc<CacheStore>,
    registry: Arc<CacheRegistry>,
    queue: Arc<EventQueue>,
}

impl CacheConsumer {
    pub fn new(
        config: CacheConfig,
        store: Arc<CacheStore>,
        registry: Arc<CacheRegistry>,
        queue: Arc<EventQueue>,
    ) -> Self {
        Self {
            config,
            store,
            registry,
            queue,
        }
    }

    /// Consume pending events; returns true if any were processed.
    pub fn consume(&self) -> bool {
        let started_at = Instant::now();
        let events = self.queue.drain(self.config.consume_batch_limit);
        if events.is_empty() {
            return false;
        }

        let event_count = events.len();
        let event_ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
        let plan = ConsumptionPlan::from_events(events);

        debug!(
            target = "creatorhub::cache",
            event_count,
            event_ids = ?event_ids,
            plan = %plan,
            "Cache consumption starting"
        );

        let invalidated = self.execute(&plan);

        info!(
            target = "creatorhub::cache",
            event_count,
            tags = plan.invalidate_tags.len(),
            flush = plan.flush,
            invalidated,
            "Cache consumption complete"
        );
        histogram!(METRIC_CACHE_CONSUME_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        true
    }

    /// Consume until the queue is empty.
    pub fn consume_all(&self) {
        while self.consume() {}
    }

    fn execute(&self, plan: &ConsumptionPlan) -> usize {
        if plan.flush {
            let dropped = self.store.len();
            self.registry.clear_then(|| self.store.clear());
            counter!(METRIC_CACHE_INVALIDATED, "reason" => "flush").increment(dropped as u64);
            return dropped;
        }
        if plan.invalidate_tags.is_empty() {
            return 0;
        }

        // Loads in flight observe the bump and discard their results.
        self.store.bump_generation();

        let mut dropped = 0;
        for tag in &plan.invalidate_tags {
            for key in self.registry.take_tag(tag) {
                if self.store.remove(&key) {
                    dropped += 1;
                }
            }
        }
        counter!(METRIC_CACHE_INVALIDATED, "reason" => "tag").increment(dropped as u64);
        dropped
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }
}
