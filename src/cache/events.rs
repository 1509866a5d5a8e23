//! Cache event system.
//!
//! Writes publish a [`CacheEvent`] describing what changed; the consumer maps
//! events to tags and drops the affected entries.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::gauge;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::lock::mutex_lock;

const SOURCE: &str = "cache::events";
const METRIC_QUEUE_LEN: &str = "creatorhub_cache_event_queue_len";

/// Monotonic per-process event sequence number.
pub type Epoch = u64;

#[derive(Debug, Clone)]
pub struct CacheEvent {
    /// Unique identifier used to drop duplicates.
    pub id: Uuid,
    pub epoch: Epoch,
    pub kind: EventKind,
    pub timestamp: OffsetDateTime,
}

impl CacheEvent {
    pub fn new(kind: EventKind, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            kind,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// What a write changed. Usernames are the owner's current public handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A schedule item was created, deleted, completed or announced.
    ScheduleChanged { user_id: Uuid, username: String },
    /// A tracked media status, rating or season set changed.
    MediaStatusChanged { user_id: Uuid, username: String },
    /// A follow edge was added or removed.
    FollowChanged {
        follower_id: Uuid,
        follower_username: String,
        following_id: Uuid,
        following_username: String,
    },
    SponsorsChanged { user_id: Uuid, username: String },
    SocialsChanged { user_id: Uuid, username: String },
    /// Profile settings changed. On a rename both handles are stale.
    ProfileChanged {
        user_id: Uuid,
        old_username: String,
        new_username: String,
    },
    /// Channel statistics were refreshed from YouTube.
    ChannelStatsSynced { username: String },
    /// Drop every entry.
    Flush,
}

/// In-memory event queue. Contention is low, so a mutex suffices.
pub struct EventQueue {
    queue: Mutex<VecDeque<CacheEvent>>,
    epoch_counter: AtomicU64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            epoch_counter: AtomicU64::new(0),
        }
    }

    pub fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }

    pub fn publish(&self, kind: EventKind) {
        let event = CacheEvent::new(kind, self.next_epoch());

        debug!(
            target = "creatorhub::cache",
            event_id = %event.id,
            event_epoch = event.epoch,
            event_kind = ?event.kind,
            "Cache event enqueued"
        );

        let mut queue = mutex_lock(&self.queue, SOURCE, "publish");
        queue.push_back(event);
        gauge!(METRIC_QUEUE_LEN).set(queue.len() as f64);
    }

    /// Drain up to `limit` events in FIFO order.
    pub fn drain(&self, limit: usize) -> Vec<CacheEvent> {
        let mut queue = mutex_lock(&self.queue, SOURCE, "drain");
        let count = limit.min(queue.len());
        let drained = queue.drain(..count).collect();
        gauge!(METRIC_QUEUE_LEN).set(queue.len() as f64);
        drained
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.queue, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    fn schedule_changed() -> EventKind {
        EventKind::ScheduleChanged {
            user_id: Uuid::nil(),
            username: "neo".to_string(),
        }
    }

    #[test]
    fn epochs_are_monotonic() {
        let queue = EventQueue::new();
        let first = queue.next_epoch();
        let second = queue.next_epoch();
        assert!(first < second);
    }

    #[test]
    fn publish_and_drain_fifo() {
        let queue = EventQueue::new();
        queue.publish(schedule_changed());
        queue.publish(EventKind::Flush);
        queue.publish(EventKind::ChannelStatsSynced {
            username: "neo".to_string(),
        });
        assert_eq!(queue.len(), 3);

        let events = queue.drain(2);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, schedule_changed());
        assert_eq!(events[1].kind, EventKind::Flush);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.drain(100).len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn event_queue_recovers_from_poisoned_lock() {
        let queue = EventQueue::new();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = queue.queue.lock().expect("queue lock");
            panic!("poison queue lock");
        }));

        queue.publish(EventKind::Flush);
        assert_eq!(queue.len(), 1);
    }
}
