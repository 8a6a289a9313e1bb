//! Canonical local-calendar-day identifiers.
//!
//! # Responsibility
//! - Map an absolute instant to its `YYYY-MM-DD` local day key.
//! - Decode a key back to the first instant of that local day.
//!
//! # Invariants
//! - Formatting is locale independent (always ASCII digits, zero padded).
//! - Persisted keys have four-digit years, so they sort lexically in
//!   calendar order; `try_for_instant` refuses anything else.
//! - `DayKey::for_instant(start_instant(key)) == key` under one timezone.
//! - Round-trips across a timezone change are not guaranteed.

use crate::calendar::{local_date, start_of_day, CalendarError};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Years whose `%Y` rendering is exactly four digits.
pub const MIN_KEY_YEAR: i32 = 0;
pub const MAX_KEY_YEAR: i32 = 9999;

static DAY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid day key regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayKeyError {
    /// Input is not shaped like `YYYY-MM-DD`.
    Malformed(String),
    /// Shape is right but the date does not exist (e.g. `2026-02-30`).
    NonexistentDate(String),
    /// The local day has no start instant in the requested timezone.
    Calendar(CalendarError),
    /// The local date falls outside `MIN_KEY_YEAR..=MAX_KEY_YEAR`.
    YearOutOfRange(NaiveDate),
}

impl Display for DayKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(value) => write!(f, "malformed day key `{value}`; expected YYYY-MM-DD"),
            Self::NonexistentDate(value) => write!(f, "day key `{value}` is not a calendar date"),
            Self::Calendar(err) => write!(f, "{err}"),
            Self::YearOutOfRange(date) => write!(
                f,
                "local date {date} is outside day key years {MIN_KEY_YEAR:04}..={MAX_KEY_YEAR}"
            ),
        }
    }
}

impl Error for DayKeyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Calendar(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CalendarError> for DayKeyError {
    fn from(value: CalendarError) -> Self {
        Self::Calendar(value)
    }
}

/// Local calendar day used for every bucketing decision.
///
/// Ordered chronologically; displays and serializes as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Day key of `instant` as observed in `tz`.
    pub fn for_instant<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> Self {
        Self(local_date(instant, tz))
    }

    /// Day key of `instant` in `tz`, rejecting dates with no four-digit key.
    pub fn try_for_instant<Tz: TimeZone>(
        instant: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<Self, DayKeyError> {
        let key = Self::for_instant(instant, tz);
        if key.is_canonical() {
            Ok(key)
        } else {
            Err(DayKeyError::YearOutOfRange(key.0))
        }
    }

    /// Whether this day renders as a four-digit-year `YYYY-MM-DD` key.
    pub fn is_canonical(self) -> bool {
        (MIN_KEY_YEAR..=MAX_KEY_YEAR).contains(&self.0.year())
    }

    /// Parses a canonical `YYYY-MM-DD` key.
    pub fn parse(value: &str) -> Result<Self, DayKeyError> {
        if !DAY_KEY_RE.is_match(value) {
            return Err(DayKeyError::Malformed(value.to_string()));
        }
        NaiveDate::parse_from_str(value, DAY_KEY_FORMAT)
            .map(Self)
            .map_err(|_| DayKeyError::NonexistentDate(value.to_string()))
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// First instant of this day in `tz`.
    pub fn start_instant<Tz: TimeZone>(self, tz: &Tz) -> Result<DateTime<Utc>, DayKeyError> {
        Ok(start_of_day(self.0, tz)?)
    }

    pub fn previous(self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }

    pub fn next(self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }
}

impl Display for DayKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DAY_KEY_FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = DayKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Day key string of `instant` in `tz`.
pub fn day_key<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> String {
    DayKey::for_instant(instant, tz).to_string()
}

/// Start instant of the local day named by `key` in `tz`.
pub fn parse_day_key<Tz: TimeZone>(key: &str, tz: &Tz) -> Result<DateTime<Utc>, DayKeyError> {
    DayKey::parse(key)?.start_instant(tz)
}
