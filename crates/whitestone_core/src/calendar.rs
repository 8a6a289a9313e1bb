//! Clock and local-calendar adapter.
//!
//! # Responsibility
//! - Supply "now" and the timezone that defines local calendar days.
//! - Own all day/month boundary math (month lengths, weekday numbering,
//!   month offsets) so no other module hardcodes calendar facts.
//!
//! # Invariants
//! - Day and month intervals are half-open `[start, end)` in UTC instants.
//! - Weekday offsets use the Monday = 0 convention.
//! - The timezone is whatever the clock reports at call time; nothing here
//!   pins a timezone per record.

use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, Local, Months, NaiveDate, NaiveTime,
    TimeZone, Utc,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Longest DST gap probed when local midnight does not exist.
const MAX_MIDNIGHT_GAP_MINUTES: i64 = 3 * 60;

/// Source of the current instant and the local timezone.
pub trait Clock {
    type Tz: TimeZone;

    fn now(&self) -> DateTime<Utc>;
    fn timezone(&self) -> Self::Tz;

    /// Local calendar date of [`Clock::now`].
    fn today(&self) -> NaiveDate {
        local_date(self.now(), &self.timezone())
    }
}

/// Wall clock in the device's current timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Tz = Local;

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn timezone(&self) -> Local {
        Local
    }
}

/// Clock frozen at one instant in an explicit timezone.
///
/// Used by tests and replay tooling that must not depend on host time.
#[derive(Debug, Clone)]
pub struct FixedClock<Tz = FixedOffset> {
    now: DateTime<Utc>,
    tz: Tz,
}

impl<Tz: TimeZone> FixedClock<Tz> {
    pub fn new(now: DateTime<Utc>, tz: Tz) -> Self {
        Self { now, tz }
    }
}

impl<Tz: TimeZone> Clock for FixedClock<Tz> {
    type Tz = Tz;

    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn timezone(&self) -> Tz {
        self.tz.clone()
    }
}

pub type CalendarResult<T> = Result<T, CalendarError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarError {
    /// No instant in the timezone maps to the start of this local day.
    UnrepresentableLocalDay(NaiveDate),
    /// Date arithmetic left chrono's supported range.
    OutOfRange,
}

impl Display for CalendarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrepresentableLocalDay(date) => {
                write!(f, "local day {date} has no representable start instant")
            }
            Self::OutOfRange => write!(f, "calendar arithmetic out of supported range"),
        }
    }
}

impl Error for CalendarError {}

/// Half-open interval of absolute instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Local calendar date that `instant` falls on in `tz`.
pub fn local_date<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// First existing local instant of `date`.
///
/// Local midnight normally; when a DST transition skips midnight, the first
/// minute after the gap. Ambiguous midnights resolve to the earlier instant.
pub fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> CalendarResult<DateTime<Utc>> {
    let midnight = date.and_time(NaiveTime::MIN);
    if let Some(start) = tz.from_local_datetime(&midnight).earliest() {
        return Ok(start.with_timezone(&Utc));
    }

    (1..=MAX_MIDNIGHT_GAP_MINUTES)
        .find_map(|minute| {
            tz.from_local_datetime(&(midnight + Duration::minutes(minute)))
                .earliest()
        })
        .map(|start| start.with_timezone(&Utc))
        .ok_or(CalendarError::UnrepresentableLocalDay(date))
}

/// Instants belonging to local `date`.
pub fn day_interval<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> CalendarResult<TimeInterval> {
    let next = date.succ_opt().ok_or(CalendarError::OutOfRange)?;
    Ok(TimeInterval {
        start: start_of_day(date, tz)?,
        end: start_of_day(next, tz)?,
    })
}

/// Instants belonging to the local month containing `date`.
pub fn month_interval<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> CalendarResult<TimeInterval> {
    let first = first_of_month(date);
    let next = first
        .checked_add_months(Months::new(1))
        .ok_or(CalendarError::OutOfRange)?;
    Ok(TimeInterval {
        start: start_of_day(first, tz)?,
        end: start_of_day(next, tz)?,
    })
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Last day of the month containing `date`.
pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Number of days in the month containing `date`, leap years included.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = first_of_month(date);
    match first.checked_add_months(Months::new(1)) {
        Some(next) => (next - first).num_days() as u32,
        // Only December of chrono's last year has no successor month.
        None => 31,
    }
}

/// Weekday of the 1st of `date`'s month, Monday = 0 through Sunday = 6.
pub fn weekday_offset_of_first(date: NaiveDate) -> u32 {
    first_of_month(date).weekday().num_days_from_monday()
}

/// Moves `date` by `delta` months, clamping the day to the target month.
pub fn offset_month(date: NaiveDate, delta: i32) -> CalendarResult<NaiveDate> {
    let months = Months::new(delta.unsigned_abs());
    let shifted = if delta >= 0 {
        date.checked_add_months(months)
    } else {
        date.checked_sub_months(months)
    };
    shifted.ok_or(CalendarError::OutOfRange)
}

/// Sunday on or before `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_sunday()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn days_in_month_tracks_leap_years() {
        assert_eq!(days_in_month(date(2024, 2, 10)), 29);
        assert_eq!(days_in_month(date(2023, 2, 10)), 28);
        assert_eq!(days_in_month(date(1900, 2, 1)), 28);
        assert_eq!(days_in_month(date(2000, 2, 1)), 29);
        assert_eq!(days_in_month(date(2026, 4, 30)), 30);
        assert_eq!(days_in_month(date(2026, 12, 31)), 31);
    }

    #[test]
    fn last_of_month_follows_month_length() {
        assert_eq!(last_of_month(date(2024, 2, 3)), date(2024, 2, 29));
        assert_eq!(last_of_month(date(2026, 12, 1)), date(2026, 12, 31));
        assert_eq!(last_of_month(date(2026, 4, 30)), date(2026, 4, 30));
    }

    #[test]
    fn weekday_offset_matches_sunday_one_formula() {
        for month in 1..=12 {
            let first = date(2026, month, 1);
            let sunday_one = first.weekday().number_from_sunday();
            assert_eq!(weekday_offset_of_first(first), (sunday_one + 5) % 7);
        }
        // 2026-06-01 is a Monday.
        assert_eq!(date(2026, 6, 1).weekday(), Weekday::Mon);
        assert_eq!(weekday_offset_of_first(date(2026, 6, 17)), 0);
    }

    #[test]
    fn offset_month_clamps_day() {
        assert_eq!(offset_month(date(2024, 1, 31), 1).unwrap(), date(2024, 2, 29));
        assert_eq!(offset_month(date(2026, 3, 31), -1).unwrap(), date(2026, 2, 28));
        assert_eq!(offset_month(date(2026, 1, 15), -1).unwrap(), date(2025, 12, 15));
    }

    #[test]
    fn day_interval_is_half_open_in_local_time() {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let interval = day_interval(date(2026, 3, 1), &tz).unwrap();
        assert_eq!(interval.start.to_rfc3339(), "2026-02-28T15:00:00+00:00");
        assert_eq!(interval.end - interval.start, Duration::days(1));
        assert!(interval.contains(interval.start));
        assert!(!interval.contains(interval.end));
    }

    #[test]
    fn month_interval_spans_whole_local_month() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let interval = month_interval(date(2024, 2, 17), &tz).unwrap();
        assert_eq!(interval.start.to_rfc3339(), "2024-01-31T22:00:00+00:00");
        assert_eq!(interval.end - interval.start, Duration::days(29));
    }

    #[test]
    fn start_of_week_is_sunday() {
        let sunday = start_of_week(date(2026, 10, 21));
        assert_eq!(sunday, date(2026, 10, 18));
        assert_eq!(start_of_week(sunday), sunday);
    }
}
