//! Analysis window for a planning run

use anyhow::{ensure, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Half-open time range `[start, end)` covering the whole run.
///
/// Every minute offset in the pipeline is counted from `start`, and day
/// offsets are whole calendar days from `start`'s date. A window whose
/// start is not strictly before its end is a configuration error, the
/// only fatal one in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanningWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl PlanningWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        ensure!(start < end, "planning window must start before it ends");
        Ok(Self { start, end })
    }

    /// Window from midnight of `from` up to midnight of `to` (exclusive).
    pub fn from_dates(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        Self::new(from.and_time(NaiveTime::MIN), to.and_time(NaiveTime::MIN))
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at < self.end
    }

    /// Whole minutes elapsed from the window start to `at`.
    pub fn minutes_from_start(&self, at: NaiveDateTime) -> i64 {
        at.signed_duration_since(self.start).num_minutes()
    }

    /// Whole calendar days between the window start date and `at`'s date.
    /// Negative for instants before the window.
    pub fn day_offset(&self, at: NaiveDateTime) -> i64 {
        at.date().signed_duration_since(self.start.date()).num_days()
    }

    /// Absolute instant for a minute offset from the window start.
    pub fn instant_at(&self, minute: i64) -> NaiveDateTime {
        self.start + Duration::minutes(minute)
    }

    /// Calendar days touched by the window, in order.
    pub fn days(&self) -> Vec<NaiveDate> {
        let last = self
            .end
            .checked_sub_signed(Duration::seconds(1))
            .map(|t| t.date())
            .unwrap_or_else(|| self.start.date());

        let mut days = Vec::new();
        let mut day = self.start.date();
        while day <= last {
            days.push(day);
            let Some(next) = day.succ_opt() else { break };
            day = next;
        }
        days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window() -> PlanningWindow {
        PlanningWindow::from_dates(date(2023, 3, 1), date(2023, 3, 4)).unwrap()
    }

    #[test]
    fn test_rejects_inverted_window() {
        assert!(PlanningWindow::from_dates(date(2023, 3, 4), date(2023, 3, 1)).is_err());
        assert!(PlanningWindow::from_dates(date(2023, 3, 1), date(2023, 3, 1)).is_err());
    }

    #[test]
    fn test_contains_is_half_open() {
        let w = window();
        assert!(w.contains(w.start()));
        assert!(w.contains(date(2023, 3, 3).and_hms_opt(23, 59, 0).unwrap()));
        assert!(!w.contains(w.end()));
        assert!(!w.contains(date(2023, 2, 28).and_hms_opt(12, 0, 0).unwrap()));
    }

    #[test]
    fn test_minute_offsets_span_days() {
        let w = window();
        let at = date(2023, 3, 2).and_hms_opt(7, 30, 0).unwrap();
        assert_eq!(w.minutes_from_start(at), 1440 + 450);
        assert_eq!(w.day_offset(at), 1);
        assert_eq!(w.instant_at(1440 + 450), at);
    }

    #[test]
    fn test_day_offset_negative_before_window() {
        let w = window();
        let at = date(2023, 2, 27).and_hms_opt(9, 0, 0).unwrap();
        assert_eq!(w.day_offset(at), -2);
    }

    #[test]
    fn test_days_lists_each_calendar_day_once() {
        let days = window().days();
        assert_eq!(days, vec![date(2023, 3, 1), date(2023, 3, 2), date(2023, 3, 3)]);
    }
}
