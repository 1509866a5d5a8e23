//! Consumption plan generation.
//!
//! This is the single place that knows which cached reads a write affects.
//! Events are merged into one set of tags so a burst of writes drops each
//! entry at most once.

use std::collections::HashSet;
use std::fmt;

use super::events::{CacheEvent, EventKind};
use super::keys::Tag;

#[derive(Debug, Default)]
pub struct ConsumptionPlan {
    pub invalidate_tags: HashSet<Tag>,
    /// Drop everything; tags are irrelevant when set.
    pub flush: bool,
}

impl fmt::Display for ConsumptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConsumptionPlan {{ invalidate: {}, flush: {} }}",
            self.invalidate_tags.len(),
            self.flush
        )
    }
}

impl ConsumptionPlan {
    /// Merge events into a plan, ignoring duplicates by event id.
    pub fn from_events(events: Vec<CacheEvent>) -> Self {
        let mut plan = Self::default();
        let mut seen = HashSet::new();

        for event in events.into_iter().filter(|e| seen.insert(e.id)) {
            plan.apply(&event.kind);
        }

        if plan.flush {
            plan.invalidate_tags.clear();
        }
        plan
    }

    fn apply(&mut self, kind: &EventKind) {
        let tags = &mut self.invalidate_tags;
        match kind {
            EventKind::ScheduleChanged { user_id, username } => {
                tags.insert(Tag::schedule(*user_id));
                tags.insert(Tag::overlay(username));
            }
            EventKind::MediaStatusChanged { user_id, username } => {
                tags.insert(Tag::watchlist(*user_id));
                tags.insert(Tag::overlay(username));
            }
            EventKind::FollowChanged {
                follower_id,
                follower_username,
                following_id,
                following_username,
            } => {
                tags.insert(Tag::follows(*follower_id));
                tags.insert(Tag::follows(*following_id));
                tags.insert(Tag::profile(follower_username));
                tags.insert(Tag::profile(following_username));
            }
            EventKind::SponsorsChanged { user_id, username } => {
                tags.insert(Tag::sponsors(*user_id));
                tags.insert(Tag::overlay(username));
            }
            EventKind::SocialsChanged { user_id, username } => {
                tags.insert(Tag::socials(*user_id));
                tags.insert(Tag::profile(username));
            }
            EventKind::ProfileChanged {
                user_id,
                old_username,
                new_username,
            } => {
                for username in [old_username, new_username] {
                    tags.insert(Tag::profile(username));
                    tags.insert(Tag::overlay(username));
                }
                tags.insert(Tag::schedule(*user_id));
                tags.insert(Tag::watchlist(*user_id));
            }
            EventKind::ChannelStatsSynced { username } => {
                tags.insert(Tag::profile(username));
                tags.insert(Tag::overlay(username));
            }
            EventKind::Flush => self.flush = true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.flush && self.invalidate_tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn plan_for(kinds: Vec<EventKind>) -> ConsumptionPlan {
        let events = kinds
            .into_iter()
            .enumerate()
            .map(|(epoch, kind)| CacheEvent::new(kind, epoch as u64))
            .collect();
        ConsumptionPlan::from_events(events)
    }

    #[test]
    fn schedule_change_stales_schedule_and_overlay() {
        let id = Uuid::new_v4();
        let plan = plan_for(vec![EventKind::ScheduleChanged {
            user_id: id,
            username: "Neo".to_string(),
        }]);

        assert!(plan.invalidate_tags.contains(&Tag::schedule(id)));
        assert!(plan.invalidate_tags.contains(&Tag::overlay("neo")));
        assert_eq!(plan.invalidate_tags.len(), 2);
    }

    #[test]
    fn follow_change_touches_both_sides() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let plan = plan_for(vec![EventKind::FollowChanged {
            follower_id: a,
            follower_username: "alice".to_string(),
            following_id: b,
            following_username: "bob".to_string(),
        }]);

        assert!(plan.invalidate_tags.contains(&Tag::follows(a)));
        assert!(plan.invalidate_tags.contains(&Tag::follows(b)));
        assert!(plan.invalidate_tags.contains(&Tag::profile("alice")));
        assert!(plan.invalidate_tags.contains(&Tag::profile("bob")));
    }

    #[test]
    fn rename_stales_old_and_new_handles() {
        let id = Uuid::new_v4();
        let plan = plan_for(vec![EventKind::ProfileChanged {
            user_id: id,
            old_username: "old".to_string(),
            new_username: "new".to_string(),
        }]);

        for tag in [
            Tag::profile("old"),
            Tag::profile("new"),
            Tag::overlay("old"),
            Tag::overlay("new"),
            Tag::schedule(id),
            Tag::watchlist(id),
        ] {
            assert!(plan.invalidate_tags.contains(&tag), "missing {tag}");
        }
    }

    #[test]
    fn sponsors_and_socials() {
        let id = Uuid::new_v4();
        let plan = plan_for(vec![
            EventKind::SponsorsChanged {
                user_id: id,
                username: "neo".to_string(),
            },
            EventKind::SocialsChanged {
                user_id: id,
                username: "neo".to_string(),
            },
        ]);

        assert!(plan.invalidate_tags.contains(&Tag::sponsors(id)));
        assert!(plan.invalidate_tags.contains(&Tag::overlay("neo")));
        assert!(plan.invalidate_tags.contains(&Tag::socials(id)));
        assert!(plan.invalidate_tags.contains(&Tag::profile("neo")));
    }

    #[test]
    fn duplicate_events_merge() {
        let event = CacheEvent::new(
            EventKind::ChannelStatsSynced {
                username: "neo".to_string(),
            },
            0,
        );
        let plan = ConsumptionPlan::from_events(vec![event.clone(), event]);
        assert_eq!(plan.invalidate_tags.len(), 2);
    }

    #[test]
    fn flush_overrides_tags() {
        let plan = plan_for(vec![
            EventKind::ChannelStatsSynced {
                username: "neo".to_string(),
            },
            EventKind::Flush,
        ]);
        assert!(plan.flush);
        assert!(plan.invalidate_tags.is_empty());
        assert!(!plan.is_empty());
    }

    #[test]
    fn display_format() {
        let display = ConsumptionPlan::default().to_string();
        assert!(display.contains("invalidate: 0"));
        assert!(ConsumptionPlan::default().is_empty());
    }
}
