//! Game calendar - maps UTC instants onto the session's local calendar day.
//!
//! Daily limits (one sleep request per day) and the overdue-sleep cutoff are
//! measured against local midnight in a fixed UTC offset.

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Offset, TimeZone, Utc};

use crate::DomainError;

/// Local calendar in a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameCalendar {
    offset: FixedOffset,
}

impl GameCalendar {
    /// Calendar with the given whole-hour offset from UTC (-12..=14).
    pub fn with_offset_hours(hours: i32) -> Result<Self, DomainError> {
        if !(-12..=14).contains(&hours) {
            return Err(DomainError::validation(format!(
                "UTC offset out of range: {hours}"
            )));
        }
        FixedOffset::east_opt(hours * 3600)
            .map(|offset| Self { offset })
            .ok_or_else(|| DomainError::validation(format!("UTC offset out of range: {hours}")))
    }

    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    #[inline]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The UTC instant of the most recent local midnight at or before `now`.
    pub fn start_of_day(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_date = now.with_timezone(&self.offset).date_naive();
        let midnight = local_date.and_time(NaiveTime::MIN);
        match self.offset.from_local_datetime(&midnight).single() {
            Some(local) => local.with_timezone(&Utc),
            None => now,
        }
    }

    /// Local date of `now` as `(day, month, year)`.
    pub fn local_date(&self, now: DateTime<Utc>) -> (u32, u32, i32) {
        let local = now.with_timezone(&self.offset);
        (local.day(), local.month(), local.year())
    }
}

impl Default for GameCalendar {
    fn default() -> Self {
        Self::utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_of_day_respects_offset() {
        let calendar = GameCalendar::with_offset_hours(7).unwrap();
        // 2025-03-11 20:00 UTC is 2025-03-12 03:00 at +07:00
        let now = Utc.with_ymd_and_hms(2025, 3, 11, 20, 0, 0).unwrap();
        let start = calendar.start_of_day(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 11, 17, 0, 0).unwrap());
        assert_eq!(calendar.local_date(now), (12, 3, 2025));
    }

    #[test]
    fn rejects_out_of_range_offsets() {
        assert!(GameCalendar::with_offset_hours(15).is_err());
        assert!(GameCalendar::with_offset_hours(-13).is_err());
    }
}
