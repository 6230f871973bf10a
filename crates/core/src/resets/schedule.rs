//! Reset schedule arithmetic
//!
//! All computations use UTC so every client agrees on the boundary
//! regardless of its locale.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use questline_domain::{QuestlineError, ResetConfig, ResetKind, Result};

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;

/// Fixed periodic schedule for both reset kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetSchedule {
    reset_time: NaiveTime,
    weekday: Weekday,
}

impl ResetSchedule {
    /// Daily resets at `hour_utc:00`, weekly resets at the same hour on
    /// `weekday`.
    ///
    /// # Errors
    /// Returns `QuestlineError::Config` if `hour_utc` is not in `0..24`.
    pub fn new(hour_utc: u32, weekday: Weekday) -> Result<Self> {
        let reset_time = NaiveTime::from_hms_opt(hour_utc, 0, 0).ok_or_else(|| {
            QuestlineError::Config(format!("Invalid reset hour: {hour_utc} (expected 0-23)"))
        })?;
        Ok(Self { reset_time, weekday })
    }

    /// Build the schedule from configuration.
    ///
    /// # Errors
    /// Returns `QuestlineError::Config` for an out-of-range hour or weekday.
    pub fn from_config(config: &ResetConfig) -> Result<Self> {
        let weekday = weekday_from_sunday(config.weekly_reset_weekday)?;
        Self::new(config.reset_hour_utc, weekday)
    }

    #[must_use]
    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    #[must_use]
    pub fn period(kind: ResetKind) -> Duration {
        match kind {
            ResetKind::Daily => Duration::days(1),
            ResetKind::Weekly => Duration::weeks(1),
        }
    }

    /// First occurrence of `kind` strictly after `now`.
    #[must_use]
    pub fn next_occurrence(&self, kind: ResetKind, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = self.reset_on_day_of(now);
        match kind {
            ResetKind::Daily => {
                if today <= now {
                    today + Duration::days(1)
                } else {
                    today
                }
            }
            ResetKind::Weekly => {
                let current = now.weekday().num_days_from_sunday();
                let target = self.weekday.num_days_from_sunday();
                let mut days_until = (target + 7 - current) % 7;
                if days_until == 0 && today <= now {
                    days_until = 7;
                }
                today + Duration::days(i64::from(days_until))
            }
        }
    }

    /// Most recent occurrence of `kind` at or before `now`.
    #[must_use]
    pub fn latest_occurrence(&self, kind: ResetKind, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = self.reset_on_day_of(now);
        match kind {
            ResetKind::Daily => {
                if today > now {
                    today - Duration::days(1)
                } else {
                    today
                }
            }
            ResetKind::Weekly => {
                let current = now.weekday().num_days_from_sunday();
                let target = self.weekday.num_days_from_sunday();
                let days_since = (current + 7 - target) % 7;
                let candidate = today - Duration::days(i64::from(days_since));
                if candidate > now {
                    candidate - Duration::weeks(1)
                } else {
                    candidate
                }
            }
        }
    }

    fn reset_on_day_of(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.date_naive().and_time(self.reset_time).and_utc()
    }
}

/// Map days-from-Sunday (0 = Sunday) onto a [`Weekday`].
///
/// # Errors
/// Returns `QuestlineError::Config` for values above 6.
pub fn weekday_from_sunday(days: u32) -> Result<Weekday> {
    match days {
        0 => Ok(Weekday::Sun),
        1 => Ok(Weekday::Mon),
        2 => Ok(Weekday::Tue),
        3 => Ok(Weekday::Wed),
        4 => Ok(Weekday::Thu),
        5 => Ok(Weekday::Fri),
        6 => Ok(Weekday::Sat),
        _ => Err(QuestlineError::Config(format!(
            "Invalid weekly reset weekday: {days} (expected 0-6, 0 = Sunday)"
        ))),
    }
}

/// Human-readable countdown.
///
/// `"1d 4h 05m"` from a day up, `"4h 05m"` from an hour up, `"05m 09s"`
/// below that. Negative durations render as zero.
#[must_use]
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    let days = total / SECONDS_PER_DAY;
    let hours = (total % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
    let minutes = (total % SECONDS_PER_HOUR) / 60;
    let seconds = total % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes:02}m")
    } else if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else {
        format!("{minutes:02}m {seconds:02}s")
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn schedule() -> ResetSchedule {
        ResetSchedule::new(15, Weekday::Tue).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_daily_next_is_today_before_reset_hour() {
        // 2026-03-04 is a Wednesday
        let now = at(2026, 3, 4, 9, 0, 0);
        assert_eq!(schedule().next_occurrence(ResetKind::Daily, now), at(2026, 3, 4, 15, 0, 0));
    }

    #[test]
    fn test_daily_next_rolls_over_at_the_boundary() {
        let now = at(2026, 3, 4, 15, 0, 0);
        assert_eq!(schedule().next_occurrence(ResetKind::Daily, now), at(2026, 3, 5, 15, 0, 0));
        assert_eq!(schedule().latest_occurrence(ResetKind::Daily, now), now);
    }

    #[test]
    fn test_weekly_next_lands_on_tuesday() {
        let wednesday = at(2026, 3, 4, 9, 0, 0);
        assert_eq!(
            schedule().next_occurrence(ResetKind::Weekly, wednesday),
            at(2026, 3, 10, 15, 0, 0)
        );

        let tuesday_morning = at(2026, 3, 10, 8, 0, 0);
        assert_eq!(
            schedule().next_occurrence(ResetKind::Weekly, tuesday_morning),
            at(2026, 3, 10, 15, 0, 0)
        );

        let tuesday_evening = at(2026, 3, 10, 18, 0, 0);
        assert_eq!(
            schedule().next_occurrence(ResetKind::Weekly, tuesday_evening),
            at(2026, 3, 17, 15, 0, 0)
        );
    }

    #[test]
    fn test_weekly_latest_before_boundary_is_previous_week() {
        let tuesday_morning = at(2026, 3, 10, 8, 0, 0);
        assert_eq!(
            schedule().latest_occurrence(ResetKind::Weekly, tuesday_morning),
            at(2026, 3, 3, 15, 0, 0)
        );
    }

    #[test]
    fn test_next_occurrence_stays_within_one_period() {
        let schedule = schedule();
        let start = at(2026, 2, 27, 0, 0, 0);

        // Sample every 37 minutes across two weeks
        for step in 0..(14 * 24 * 60 / 37) {
            let now = start + Duration::minutes(37 * step);
            for kind in ResetKind::ALL {
                let next = schedule.next_occurrence(kind, now);
                let latest = schedule.latest_occurrence(kind, now);

                assert!(next > now, "{kind} next {next} not after {now}");
                assert!(next - now <= ResetSchedule::period(kind));
                assert!(latest <= now);
                assert_eq!(next - latest, ResetSchedule::period(kind));
            }
        }
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        assert!(ResetSchedule::new(24, Weekday::Tue).is_err());
        assert!(weekday_from_sunday(7).is_err());

        let config = ResetConfig { weekly_reset_weekday: 4, ..ResetConfig::default() };
        assert_eq!(ResetSchedule::from_config(&config).unwrap().weekday(), Weekday::Thu);
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(Duration::seconds(9)), "00m 09s");
        assert_eq!(format_countdown(Duration::seconds(5 * 60 + 9)), "05m 09s");
        assert_eq!(format_countdown(Duration::seconds(4 * 3600 + 5 * 60)), "4h 05m");
        assert_eq!(format_countdown(Duration::seconds(86_400 + 4 * 3600 + 5 * 60 + 59)), "1d 4h 05m");
        assert_eq!(format_countdown(Duration::seconds(-30)), "00m 00s");
    }
}
