//! Rolling per-day series for the trend chart.
//!
//! # Invariants
//! - The window holds exactly `min(window_days, MAX_TREND_WINDOW_DAYS)`
//!   buckets, oldest first, ending at today; empty days are zero-filled,
//!   never skipped. The only shorter result is a window reaching past the
//!   earliest date chrono can represent.

use super::buckets::{bucket_for, DayBucket, DayBuckets};
use crate::model::day_key::DayKey;

pub const DEFAULT_TREND_WINDOW_DAYS: u32 = 14;
/// Ten years of daily slots.
pub const MAX_TREND_WINDOW_DAYS: u32 = 3660;

/// Oldest day covered by a window of `window_days` ending at `today`.
pub fn window_start(today: DayKey, window_days: u32) -> DayKey {
    let mut first = today;
    for _ in 1..window_days.min(MAX_TREND_WINDOW_DAYS) {
        match first.previous() {
            Some(day) => first = day,
            None => break,
        }
    }
    first
}

/// Buckets for `[today - (window_days - 1), today]`, clamped as above.
pub fn trend_window(today: DayKey, window_days: u32, buckets: &DayBuckets) -> Vec<DayBucket> {
    let len = window_days.min(MAX_TREND_WINDOW_DAYS) as usize;
    let mut series = Vec::with_capacity(len);
    let mut cursor = Some(today);
    while series.len() < len {
        let Some(day) = cursor else {
            break;
        };
        series.push(bucket_for(buckets, day));
        cursor = day.previous();
    }
    series.reverse();
    series
}
