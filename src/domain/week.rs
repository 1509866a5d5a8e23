//! Week windows used by the stream schedule.
//!
//! Weeks start on Monday 00:00 UTC. A week offset of `0` is the week containing
//! "now", `-1` the previous one and so on.

use time::{Duration, OffsetDateTime};

use crate::domain::error::DomainError;

pub const MAX_WEEK_OFFSET: i32 = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub offset: i32,
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl WeekWindow {
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        instant >= self.start && instant < self.end
    }
}

pub fn validate_offset(offset: i32) -> Result<i32, DomainError> {
    if offset.abs() > MAX_WEEK_OFFSET {
        return Err(DomainError::validation(
            "week",
            format!("offset must be within ±{MAX_WEEK_OFFSET} weeks"),
        ));
    }
    Ok(offset)
}

/// Window for `offset` weeks away from the week containing `now`.
pub fn window_for(now: OffsetDateTime, offset: i32) -> Result<WeekWindow, DomainError> {
    let offset = validate_offset(offset)?;
    let now = now.to_offset(time::UtcOffset::UTC);
    let days_from_monday = i64::from(now.weekday().number_days_from_monday());
    let monday = now.date() - Duration::days(days_from_monday);
    let start = monday.midnight().assume_utc() + Duration::weeks(i64::from(offset));

    Ok(WeekWindow {
        offset,
        start,
        end: start + Duration::weeks(1),
    })
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn current_week_starts_on_monday() {
        // 2024-05-16 is a Thursday
        let window = window_for(datetime!(2024-05-16 15:30 UTC), 0).unwrap();
        assert_eq!(window.start, datetime!(2024-05-13 00:00 UTC));
        assert_eq!(window.end, datetime!(2024-05-20 00:00 UTC));
    }

    #[test]
    fn monday_midnight_belongs_to_its_own_week() {
        let window = window_for(datetime!(2024-05-13 00:00 UTC), 0).unwrap();
        assert_eq!(window.start, datetime!(2024-05-13 00:00 UTC));
    }

    #[test]
    fn sunday_belongs_to_previous_monday() {
        let window = window_for(datetime!(2024-05-19 23:59 UTC), 0).unwrap();
        assert_eq!(window.start, datetime!(2024-05-13 00:00 UTC));
    }

    #[test]
    fn offsets_shift_whole_weeks() {
        let next = window_for(datetime!(2024-05-16 12:00 UTC), 1).unwrap();
        assert_eq!(next.start, datetime!(2024-05-20 00:00 UTC));

        let previous = window_for(datetime!(2024-05-16 12:00 UTC), -1).unwrap();
        assert_eq!(previous.start, datetime!(2024-05-06 00:00 UTC));
        assert!(previous.contains(datetime!(2024-05-12 23:00 UTC)));
        assert!(!previous.contains(datetime!(2024-05-13 00:00 UTC)));
    }

    #[test]
    fn non_utc_inputs_are_normalised() {
        // Monday 01:00 at +02:00 is still Sunday in UTC.
        let window = window_for(datetime!(2024-05-13 01:00 +2), 0).unwrap();
        assert_eq!(window.start, datetime!(2024-05-06 00:00 UTC));
    }

    #[test]
    fn rejects_far_offsets() {
        assert!(window_for(OffsetDateTime::now_utc(), 53).is_err());
        assert!(window_for(OffsetDateTime::now_utc(), -53).is_err());
    }
}
