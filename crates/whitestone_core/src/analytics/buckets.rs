//! Per-day and all-time category counts.
//!
//! # Invariants
//! - Grouping reads `Stone::day_key`, never the raw timestamp.
//! - Buckets are recomputed from a snapshot; nothing here is cached.

use super::ratio::{balance_fraction, ratio, RatioCell};
use crate::model::day_key::DayKey;
use crate::model::stone::{Stone, StoneKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Day-key ordered buckets for the days that have stones.
pub type DayBuckets = BTreeMap<DayKey, DayBucket>;

/// Counts of one day's stones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub day_key: DayKey,
    pub white: u32,
    pub black: u32,
}

impl DayBucket {
    pub fn empty(day_key: DayKey) -> Self {
        Self {
            day_key,
            white: 0,
            black: 0,
        }
    }

    pub fn record(&mut self, kind: StoneKind) {
        match kind {
            StoneKind::White => self.white += 1,
            StoneKind::Black => self.black += 1,
        }
    }

    pub fn total(&self) -> u64 {
        u64::from(self.white) + u64::from(self.black)
    }

    pub fn ratio(&self) -> Option<f64> {
        ratio(u64::from(self.white), u64::from(self.black))
    }

    pub fn ratio_cell(&self) -> RatioCell {
        RatioCell {
            day_key: self.day_key,
            ratio: self.ratio(),
        }
    }

    /// Non-empty day where white stones are at least half; ties count.
    pub fn is_on_track(&self) -> bool {
        self.total() > 0 && u64::from(self.white) * 2 >= self.total()
    }

    /// Chart stack segments, bottom first. Black always sits beneath white.
    pub fn stack(&self) -> [(StoneKind, u32); 2] {
        [(StoneKind::Black, self.black), (StoneKind::White, self.white)]
    }
}

/// Groups stones by their cached day key.
pub fn bucket_by_day<'a>(stones: impl IntoIterator<Item = &'a Stone>) -> DayBuckets {
    let mut buckets = DayBuckets::new();
    for stone in stones {
        buckets
            .entry(stone.day_key())
            .or_insert_with(|| DayBucket::empty(stone.day_key()))
            .record(stone.kind());
    }
    buckets
}

/// Bucket for `day_key`, zero-filled when the day has no stones.
pub fn bucket_for(buckets: &DayBuckets, day_key: DayKey) -> DayBucket {
    buckets
        .get(&day_key)
        .copied()
        .unwrap_or_else(|| DayBucket::empty(day_key))
}

/// All-time counts per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    pub white: u64,
    pub black: u64,
}

impl CategoryTotals {
    pub fn total(&self) -> u64 {
        self.white + self.black
    }

    pub fn ratio(&self) -> Option<f64> {
        ratio(self.white, self.black)
    }
}

pub fn totals<'a>(stones: impl IntoIterator<Item = &'a Stone>) -> CategoryTotals {
    stones
        .into_iter()
        .fold(CategoryTotals::default(), |mut acc, stone| {
            match stone.kind() {
                StoneKind::White => acc.white += 1,
                StoneKind::Black => acc.black += 1,
            }
            acc
        })
}

/// Today-screen / day-detail view of one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DaySummary {
    pub bucket: DayBucket,
    pub ratio: Option<f64>,
    /// Width share of the white segment in a ratio bar.
    pub balance_fraction: f64,
}

impl From<DayBucket> for DaySummary {
    fn from(bucket: DayBucket) -> Self {
        Self {
            ratio: bucket.ratio(),
            balance_fraction: balance_fraction(u64::from(bucket.white), u64::from(bucket.black)),
            bucket,
        }
    }
}
