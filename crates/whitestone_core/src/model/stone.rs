//! Stone domain model.
//!
//! # Responsibility
//! - Define the logged event record and its two-valued kind.
//! - Keep the cached day key bound to the timestamp it was derived from.
//!
//! # Invariants
//! - `id` is stable and never reused for another stone.
//! - `kind` is fixed at creation.
//! - `day_key == DayKey::for_instant(timestamp, tz)` for the timezone used at
//!   the last write; the timestamp can only change through `reschedule`.
//! - Timestamps carry millisecond precision, matching persisted storage.

use crate::model::day_key::{DayKey, DayKeyError};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type StoneId = Uuid;

/// Classification of a logged stone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoneKind {
    /// The "on track" category counted by ratios and streaks.
    White,
    Black,
}

impl StoneKind {
    pub const ALL: [StoneKind; 2] = [StoneKind::White, StoneKind::Black];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "white" => Some(Self::White),
            "black" => Some(Self::Black),
            _ => None,
        }
    }
}

impl Display for StoneKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoneValidationError {
    NilId,
    /// The timestamp's local day cannot be stored as a day key.
    TimestampOutOfRange {
        timestamp: DateTime<Utc>,
        reason: DayKeyError,
    },
}

impl Display for StoneValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "stone id must not be nil"),
            Self::TimestampOutOfRange { timestamp, reason } => {
                write!(f, "stone timestamp {} rejected: {reason}", timestamp.to_rfc3339())
            }
        }
    }
}

impl Error for StoneValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NilId => None,
            Self::TimestampOutOfRange { reason, .. } => Some(reason),
        }
    }
}

/// One logged occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stone {
    id: StoneId,
    kind: StoneKind,
    timestamp: DateTime<Utc>,
    note: Option<String>,
    day_key: DayKey,
}

impl Stone {
    /// Creates a stone with a fresh id, stamping its day key in `tz`.
    pub fn new<Tz: TimeZone>(
        kind: StoneKind,
        note: Option<String>,
        timestamp: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<Self, StoneValidationError> {
        let timestamp = truncate_to_millis(timestamp);
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            day_key: stamp_day_key(timestamp, tz)?,
            timestamp,
            note: normalize_note(note),
        })
    }

    /// Creates a stone with a caller-provided id (imports, fixtures).
    pub fn with_id<Tz: TimeZone>(
        id: StoneId,
        kind: StoneKind,
        note: Option<String>,
        timestamp: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<Self, StoneValidationError> {
        if id.is_nil() {
            return Err(StoneValidationError::NilId);
        }
        let mut stone = Self::new(kind, note, timestamp, tz)?;
        stone.id = id;
        Ok(stone)
    }

    /// Rebuilds a persisted record; the stored day key is trusted as written.
    pub(crate) fn from_persisted(
        id: StoneId,
        kind: StoneKind,
        timestamp: DateTime<Utc>,
        note: Option<String>,
        day_key: DayKey,
    ) -> Self {
        Self {
            id,
            kind,
            timestamp,
            note,
            day_key,
        }
    }

    pub fn id(&self) -> StoneId {
        self.id
    }

    pub fn kind(&self) -> StoneKind {
        self.kind
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn day_key(&self) -> DayKey {
        self.day_key
    }

    /// Moves the stone to `timestamp` and recomputes its day key in `tz`.
    ///
    /// Leaves the stone untouched when the new day has no storable key.
    pub fn reschedule<Tz: TimeZone>(
        &mut self,
        timestamp: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<(), StoneValidationError> {
        let timestamp = truncate_to_millis(timestamp);
        self.day_key = stamp_day_key(timestamp, tz)?;
        self.timestamp = timestamp;
        Ok(())
    }

    /// Replaces the note; empty text clears it.
    pub fn set_note(&mut self, note: Option<String>) {
        self.note = normalize_note(note);
    }
}

fn stamp_day_key<Tz: TimeZone>(
    timestamp: DateTime<Utc>,
    tz: &Tz,
) -> Result<DayKey, StoneValidationError> {
    DayKey::try_for_instant(timestamp, tz)
        .map_err(|reason| StoneValidationError::TimestampOutOfRange { timestamp, reason })
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.filter(|text| !text.trim().is_empty())
}

fn truncate_to_millis(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp.timestamp_millis()).unwrap_or(timestamp)
}
