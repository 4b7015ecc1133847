//! Year-elapsed percentage, anchored to UTC.
//!
//! The window runs from Jan 1 00:00:00.000000 to Dec 31 23:59:59.999999 of the
//! year containing `now`. The end of the window is one microsecond short of the
//! real year boundary, so `year_progress` reaches exactly 100 at that last
//! microsecond rather than at midnight.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, Utc};
use tracing::debug;

/// First and last instant of a calendar year in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl YearWindow {
    /// The window of the calendar year `now` falls in.
    pub fn containing(now: DateTime<Utc>) -> Self {
        let year = now.year();
        // Jan 1 and Dec 31 exist for every year a DateTime<Utc> can hold.
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .expect("January 1st exists in every representable year")
            .and_time(NaiveTime::MIN)
            .and_utc();
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .and_then(|last_day| last_day.and_hms_micro_opt(23, 59, 59, 999_999))
            .expect("December 31st exists in every representable year")
            .and_utc();
        Self { start, end }
    }

    /// Span between start and end, in seconds with microsecond resolution.
    pub fn total_seconds(&self) -> f64 {
        seconds(self.end - self.start)
    }

    /// Seconds elapsed between the start of the window and `now`.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        seconds(now - self.start)
    }
}

/// Percentage of the current UTC year elapsed at `now`.
pub fn year_progress(now: DateTime<Utc>) -> f64 {
    let window = YearWindow::containing(now);
    let progress = window.elapsed_seconds(now) / window.total_seconds() * 100.0;
    debug!(now = %now, progress, "Computed year progress");
    progress
}

fn seconds(delta: TimeDelta) -> f64 {
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1_000_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const NON_LEAP_SECONDS: f64 = 365.0 * 86_400.0 - 0.000_001;
    const LEAP_SECONDS: f64 = 366.0 * 86_400.0 - 0.000_001;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn window_spans_whole_year_minus_one_microsecond() {
        let window = YearWindow::containing(utc(2023, 5, 17, 8, 30, 0));
        assert_eq!(window.start, utc(2023, 1, 1, 0, 0, 0));
        assert_eq!(
            window.end,
            utc(2023, 12, 31, 23, 59, 59) + TimeDelta::microseconds(999_999)
        );
        assert!((window.total_seconds() - NON_LEAP_SECONDS).abs() < 1e-6);
    }

    #[test]
    fn leap_year_window_has_an_extra_day() {
        let leap = YearWindow::containing(utc(2024, 3, 1, 0, 0, 0));
        let common = YearWindow::containing(utc(2023, 3, 1, 0, 0, 0));
        assert!((leap.total_seconds() - LEAP_SECONDS).abs() < 1e-6);
        assert!((leap.total_seconds() - common.total_seconds() - 86_400.0).abs() < 1e-6);
    }

    #[test]
    fn start_of_year_is_zero() {
        assert_eq!(year_progress(utc(2025, 1, 1, 0, 0, 0)), 0.0);
        assert_eq!(format!("{:.2}", year_progress(utc(2024, 1, 1, 0, 0, 0))), "0.00");
    }

    #[test]
    fn last_microsecond_is_exactly_one_hundred() {
        let window = YearWindow::containing(utc(2023, 6, 1, 0, 0, 0));
        assert_eq!(year_progress(window.end), 100.0);
    }

    #[test]
    fn last_whole_second_matches_seconds_in_year() {
        for (year, total) in [(2023, NON_LEAP_SECONDS), (2024, LEAP_SECONDS)] {
            let now = utc(year, 12, 31, 23, 59, 59);
            let expected = (total - 0.999_999) / total * 100.0;
            let actual = year_progress(now);
            assert!((actual - expected).abs() < 1e-9, "{year}: {actual} != {expected}");
            assert!(actual < 100.0);
            assert_eq!(format!("{actual:.2}"), "100.00");
        }
    }

    #[test]
    fn stays_below_one_hundred_within_the_year() {
        let mut now = utc(2023, 1, 1, 0, 0, 0);
        while now.year() == 2023 {
            let progress = year_progress(now);
            assert!((0.0..100.0).contains(&progress), "{now}: {progress}");
            now += TimeDelta::hours(7);
        }
    }

    #[test]
    fn leap_and_common_midyear_differ_by_the_extra_day() {
        let leap_now = utc(2024, 7, 2, 12, 0, 0);
        let common_now = utc(2023, 7, 2, 12, 0, 0);

        // Jul 2 is one day further into a leap year.
        let leap_elapsed = 183.5 * 86_400.0;
        let common_elapsed = 182.5 * 86_400.0;

        let leap = year_progress(leap_now);
        let common = year_progress(common_now);
        assert!((leap - leap_elapsed / LEAP_SECONDS * 100.0).abs() < 1e-9);
        assert!((common - common_elapsed / NON_LEAP_SECONDS * 100.0).abs() < 1e-9);
        assert!(leap > common);
    }

    #[test]
    fn midyear_leap_day_example() {
        let progress = year_progress(utc(2024, 7, 2, 12, 0, 0));
        assert!((progress - 183.5 / 366.0 * 100.0).abs() < 1e-6);
        assert_eq!(format!("{progress:.2}"), "50.14");
    }
}
