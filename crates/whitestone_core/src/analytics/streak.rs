//! Backward-looking streak of on-track days.
//!
//! The scan starts at today and stops at the first empty or off-track day;
//! good days before a gap never count.

use super::buckets::DayBuckets;
use crate::model::day_key::DayKey;

/// Consecutive on-track days ending at `today`.
pub fn current_streak(today: DayKey, buckets: &DayBuckets) -> u32 {
    let mut streak = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor {
        match buckets.get(&day) {
            Some(bucket) if bucket.is_on_track() => streak += 1,
            _ => break,
        }
        cursor = day.previous();
    }
    streak
}
