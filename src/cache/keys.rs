//! Cache keys, invalidation tags and the per-read cache specification.
//!
//! Every cached read is described by a [`CacheSpec`]: a deterministic key, the
//! tags it is registered under, and the class that selects its TTL. Specs are
//! only built through the named constructors below so the key and tag
//! namespaces stay in one place.

use std::fmt;

use time::Date;
use uuid::Uuid;

use crate::domain::types::SearchKind;

/// Key of a single cached entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Invalidation tag grouping entries that go stale together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(String);

impl Tag {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn profile(username: &str) -> Self {
        Self(format!("profile-{}", handle(username)))
    }

    pub fn overlay(username: &str) -> Self {
        Self(format!("overlay-{}", handle(username)))
    }

    pub fn schedule(user_id: Uuid) -> Self {
        Self(format!("schedule-{user_id}"))
    }

    pub fn watchlist(user_id: Uuid) -> Self {
        Self(format!("watchlist-{user_id}"))
    }

    pub fn follows(user_id: Uuid) -> Self {
        Self(format!("follows-{user_id}"))
    }

    pub fn sponsors(user_id: Uuid) -> Self {
        Self(format!("sponsors-{user_id}"))
    }

    pub fn socials(user_id: Uuid) -> Self {
        Self(format!("socials-{user_id}"))
    }

    pub fn twitch(login: &str) -> Self {
        Self(format!("twitch-{}", handle(login)))
    }

    /// Category tags cover every entry of one kind.
    pub fn category(name: &'static str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Volatility class of a cached read; selects the TTL from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheClass {
    User,
    Profile,
    Overlay,
    Schedule,
    Watchlist,
    Follows,
    Sponsors,
    Socials,
    TwitchLive,
    Search,
}

impl CacheClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Profile => "profile",
            Self::Overlay => "overlay",
            Self::Schedule => "schedule",
            Self::Watchlist => "watchlist",
            Self::Follows => "follows",
            Self::Sponsors => "sponsors",
            Self::Socials => "socials",
            Self::TwitchLive => "twitch_live",
            Self::Search => "search",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSpec {
    pub key: CacheKey,
    pub tags: Vec<Tag>,
    pub class: CacheClass,
}

impl CacheSpec {
    fn new(key: String, tags: Vec<Tag>, class: CacheClass) -> Self {
        Self {
            key: CacheKey(key),
            tags,
            class,
        }
    }

    /// User row resolved from a public username.
    pub fn user(username: &str) -> Self {
        Self::new(
            format!("user-{}", handle(username)),
            vec![Tag::profile(username), Tag::category("profiles")],
            CacheClass::User,
        )
    }

    pub fn profile(username: &str) -> Self {
        Self::new(
            format!("profile-{}", handle(username)),
            vec![Tag::profile(username), Tag::category("profiles")],
            CacheClass::Profile,
        )
    }

    pub fn overlay(username: &str) -> Self {
        Self::new(
            format!("overlay-data-{}", handle(username)),
            vec![Tag::overlay(username), Tag::category("overlay")],
            CacheClass::Overlay,
        )
    }

    /// Keyed by the Monday the week starts on, so a cached week never
    /// outlives the calendar week it describes.
    pub fn schedule(user_id: Uuid, week_start: Date) -> Self {
        Self::new(
            format!("schedule-{user_id}-{week_start}"),
            vec![Tag::schedule(user_id), Tag::category("schedule")],
            CacheClass::Schedule,
        )
    }

    pub fn watchlist(user_id: Uuid) -> Self {
        Self::new(
            format!("watchlist-{user_id}"),
            vec![Tag::watchlist(user_id)],
            CacheClass::Watchlist,
        )
    }

    pub fn follows(user_id: Uuid) -> Self {
        Self::new(
            format!("follows-{user_id}"),
            vec![Tag::follows(user_id)],
            CacheClass::Follows,
        )
    }

    pub fn sponsors(user_id: Uuid) -> Self {
        Self::new(
            format!("sponsors-{user_id}"),
            vec![Tag::sponsors(user_id)],
            CacheClass::Sponsors,
        )
    }

    pub fn socials(user_id: Uuid) -> Self {
        Self::new(
            format!("socials-{user_id}"),
            vec![Tag::socials(user_id)],
            CacheClass::Socials,
        )
    }

    pub fn twitch_live(login: &str) -> Self {
        Self::new(
            format!("twitch-live-{}", handle(login)),
            vec![Tag::twitch(login), Tag::category("twitch")],
            CacheClass::TwitchLive,
        )
    }

    /// Search results; the query is normalised so trivially different spellings
    /// share one entry.
    pub fn search(kind: SearchKind, query: &str) -> Self {
        Self::new(
            format!("search-{}-{}", kind.as_str(), normalize_query(query)),
            vec![Tag::category("search")],
            CacheClass::Search,
        )
    }
}

fn handle(name: &str) -> String {
    name.trim().to_lowercase()
}

fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::*;
    use crate::domain::week::window_for;

    #[test]
    fn usernames_share_a_key_regardless_of_case() {
        assert_eq!(CacheSpec::overlay("Neo").key, CacheSpec::overlay("neo").key);
        assert_eq!(CacheSpec::overlay("Neo").key.as_str(), "overlay-data-neo");
    }

    #[test]
    fn overlay_carries_resource_and_category_tags() {
        let spec = CacheSpec::overlay("Neo");
        assert_eq!(spec.tags, vec![Tag::overlay("neo"), Tag::category("overlay")]);
        assert_eq!(spec.class, CacheClass::Overlay);
    }

    #[test]
    fn schedule_key_includes_week_start() {
        let id = Uuid::nil();
        let this_week = CacheSpec::schedule(id, date!(2024 - 05 - 13));
        let next_week = CacheSpec::schedule(id, date!(2024 - 05 - 20));
        assert_ne!(this_week.key, next_week.key);
        assert_eq!(this_week.tags, next_week.tags);
        assert_eq!(
            this_week.key.as_str(),
            "schedule-00000000-0000-0000-0000-000000000000-2024-05-13"
        );
    }

    #[test]
    fn current_week_key_rolls_over_on_monday() {
        let id = Uuid::nil();
        let sunday = window_for(datetime!(2024-05-19 23:59 UTC), 0).unwrap();
        let monday = window_for(datetime!(2024-05-20 00:00 UTC), 0).unwrap();
        assert_ne!(
            CacheSpec::schedule(id, sunday.start.date()).key,
            CacheSpec::schedule(id, monday.start.date()).key
        );
        let next_from_last_week = window_for(datetime!(2024-05-13 08:00 UTC), 1).unwrap();
        assert_eq!(
            CacheSpec::schedule(id, monday.start.date()).key,
            CacheSpec::schedule(id, next_from_last_week.start.date()).key
        );
    }

    #[test]
    fn search_queries_are_normalised() {
        let a = CacheSpec::search(SearchKind::Anime, "  Cowboy   Bebop ");
        let b = CacheSpec::search(SearchKind::Anime, "cowboy bebop");
        assert_eq!(a.key, b.key);
        assert_ne!(a.key, CacheSpec::search(SearchKind::Movie, "cowboy bebop").key);
    }

    #[test]
    fn user_and_profile_share_the_profile_tag() {
        assert_eq!(CacheSpec::user("Neo").tags, CacheSpec::profile("neo").tags);
        assert_ne!(CacheSpec::user("neo").key, CacheSpec::profile("neo").key);
    }
}
