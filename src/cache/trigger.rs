//! Cache trigger: the write-side API.
//!
//! Services call one method per kind of change after their mutation has
//! succeeded. Events are consumed immediately, so the next read on the same
//! process observes the write.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::config::CacheConfig;
use super::consumer::CacheConsumer;
use super::events::{EventKind, EventQueue};

pub struct CacheTrigger {
    config: CacheConfig,
    queue: Arc<EventQueue>,
    consumer: Arc<CacheConsumer>,
}

impl CacheTrigger {
    pub fn new(config: CacheConfig, queue: Arc<EventQueue>, consumer: Arc<CacheConsumer>) -> Self {
        Self {
            config,
            queue,
            consumer,
        }
    }

    /// Publish an event and optionally consume immediately.
    pub fn trigger(&self, kind: EventKind, consume_now: bool) {
        if !self.config.enabled {
            debug!(target = "creatorhub::cache", event_kind = ?kind, "Cache trigger skipped: cache disabled");
            return;
        }

        self.queue.publish(kind);

        if consume_now {
            self.consumer.consume_all();
        }
    }

    pub fn schedule_changed(&self, user_id: Uuid, username: &str) {
        self.trigger(
            EventKind::ScheduleChanged {
                user_id,
                username: username.to_string(),
            },
            true,
        );
    }

    pub fn media_status_changed(&self, user_id: Uuid, username: &str) {
        self.trigger(
            EventKind::MediaStatusChanged {
                user_id,
                username: username.to_string(),
            },
            true,
        );
    }

    pub fn follow_changed(
        &self,
        (follower_id, follower_username): (Uuid, &str),
        (following_id, following_username): (Uuid, &str),
    ) {
        self.trigger(
            EventKind::FollowChanged {
                follower_id,
                follower_username: follower_username.to_string(),
                following_id,
                following_username: following_username.to_string(),
            },
            true,
        );
    }

    pub fn sponsors_changed(&self, user_id: Uuid, username: &str) {
        self.trigger(
            EventKind::SponsorsChanged {
                user_id,
                username: username.to_string(),
            },
            true,
        );
    }

    pub fn socials_changed(&self, user_id: Uuid, username: &str) {
        self.trigger(
            EventKind::SocialsChanged {
                user_id,
                username: username.to_string(),
            },
            true,
        );
    }

    pub fn profile_changed(&self, user_id: Uuid, old_username: &str, new_username: &str) {
        self.trigger(
            EventKind::ProfileChanged {
                user_id,
                old_username: old_username.to_string(),
                new_username: new_username.to_string(),
            },
            true,
        );
    }

    pub fn channel_stats_synced(&self, username: &str) {
        self.trigger(
            EventKind::ChannelStatsSynced {
                username: username.to_string(),
            },
            true,
        );
    }

    pub fn flush(&self) {
        self.trigger(EventKind::Flush, true);
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }
}
