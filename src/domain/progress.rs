//! Season progress bookkeeping for tracked series and anime.

use std::collections::BTreeSet;

use crate::domain::error::DomainError;
use crate::domain::types::{MediaType, WatchStatus};

/// Set of watched seasons for one tracked show, kept sorted and unique.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeasonProgress {
    watched: BTreeSet<i32>,
    total: Option<i32>,
}

impl SeasonProgress {
    pub fn new(watched: &[i32], total: Option<i32>) -> Self {
        Self {
            watched: watched.iter().copied().collect(),
            total,
        }
    }

    /// Mark `season` watched or unwatched.
    ///
    /// Seasons are 1-based and, when the show's season count is known, must not
    /// exceed it.
    pub fn set(&mut self, season: i32, watched: bool) -> Result<(), DomainError> {
        if season < 1 {
            return Err(DomainError::validation("season", "seasons start at 1"));
        }
        if let Some(total) = self.total
            && season > total
        {
            return Err(DomainError::validation(
                "season",
                format!("season {season} exceeds the show's {total} seasons"),
            ));
        }

        if watched {
            self.watched.insert(season);
        } else {
            self.watched.remove(&season);
        }
        Ok(())
    }

    pub fn watched(&self) -> Vec<i32> {
        self.watched.iter().copied().collect()
    }

    pub fn is_complete(&self) -> bool {
        match self.total {
            Some(total) if total > 0 => (1..=total).all(|season| self.watched.contains(&season)),
            _ => false,
        }
    }

    /// Status implied by the watched seasons: all → watched, some → watching,
    /// none → planned.
    pub fn status(&self) -> WatchStatus {
        if self.is_complete() {
            WatchStatus::Watched
        } else if self.watched.is_empty() {
            WatchStatus::Planned
        } else {
            WatchStatus::Watching
        }
    }
}

/// Status a tracked item moves to when a scheduled session without a season
/// is completed.
pub fn status_after_session(media_type: MediaType) -> WatchStatus {
    if media_type.has_seasons() {
        WatchStatus::Watching
    } else {
        WatchStatus::Watched
    }
}

/// Ratings are on a 1–10 scale.
pub fn validate_rating(rating: i16) -> Result<i16, DomainError> {
    if (1..=10).contains(&rating) {
        Ok(rating)
    } else {
        Err(DomainError::validation("rating", "must be between 1 and 10"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_seasons_watched_is_watched() {
        let mut progress = SeasonProgress::new(&[1, 2], Some(3));
        progress.set(3, true).unwrap();
        assert_eq!(progress.status(), WatchStatus::Watched);
        assert_eq!(progress.watched(), vec![1, 2, 3]);
    }

    #[test]
    fn some_seasons_watched_is_watching() {
        let mut progress = SeasonProgress::new(&[], Some(3));
        progress.set(2, true).unwrap();
        assert_eq!(progress.status(), WatchStatus::Watching);
    }

    #[test]
    fn unwatching_last_season_returns_to_planned() {
        let mut progress = SeasonProgress::new(&[1], Some(3));
        progress.set(1, false).unwrap();
        assert_eq!(progress.status(), WatchStatus::Planned);
    }

    #[test]
    fn unknown_season_count_never_completes() {
        let mut progress = SeasonProgress::new(&[], None);
        progress.set(1, true).unwrap();
        progress.set(2, true).unwrap();
        assert_eq!(progress.status(), WatchStatus::Watching);
    }

    #[test]
    fn rejects_out_of_range_seasons() {
        let mut progress = SeasonProgress::new(&[], Some(2));
        assert!(progress.set(0, true).is_err());
        assert!(progress.set(3, true).is_err());
    }

    #[test]
    fn marking_twice_is_idempotent() {
        let mut progress = SeasonProgress::new(&[1], Some(2));
        progress.set(1, true).unwrap();
        assert_eq!(progress.watched(), vec![1]);
    }

    #[test]
    fn session_completion_status_depends_on_type() {
        assert_eq!(status_after_session(MediaType::Movie), WatchStatus::Watched);
        assert_eq!(status_after_session(MediaType::Game), WatchStatus::Watched);
        assert_eq!(status_after_session(MediaType::Anime), WatchStatus::Watching);
    }

    #[test]
    fn rating_bounds() {
        assert!(validate_rating(0).is_err());
        assert_eq!(validate_rating(7), Ok(7));
        assert!(validate_rating(11).is_err());
    }
}
