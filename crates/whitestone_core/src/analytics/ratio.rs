//! Balance ratio and display intensity.
//!
//! # Invariants
//! - `ratio` is `None` exactly when both counts are zero.
//! - `intensity(Some(r))` lies in `[INTENSITY_LOW, INTENSITY_HIGH]`;
//!   `intensity(None)` is `NEUTRAL_INTENSITY`, which lies outside it.

use crate::model::day_key::DayKey;
use serde::Serialize;

/// Intensity of an all-black day.
pub const INTENSITY_LOW: f64 = 0.15;
/// Intensity of an all-white day.
pub const INTENSITY_HIGH: f64 = 0.90;
/// Intensity of a day with no stones.
pub const NEUTRAL_INTENSITY: f64 = 0.0;

/// Fraction of white stones among all stones, `None` when there are none.
pub fn ratio(white: u64, black: u64) -> Option<f64> {
    let total = white + black;
    if total == 0 {
        return None;
    }
    Some(white as f64 / total as f64)
}

/// Linear brightness for a ratio; empty days map to the neutral value.
pub fn intensity(ratio: Option<f64>) -> f64 {
    match ratio {
        Some(r) => INTENSITY_LOW + (INTENSITY_HIGH - INTENSITY_LOW) * r,
        None => NEUTRAL_INTENSITY,
    }
}

/// Share of a ratio bar drawn white; an empty day splits evenly.
pub fn balance_fraction(white: u64, black: u64) -> f64 {
    ratio(white, black).unwrap_or(0.5)
}

/// Ratio of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatioCell {
    pub day_key: DayKey,
    pub ratio: Option<f64>,
}

impl RatioCell {
    pub fn intensity(&self) -> f64 {
        intensity(self.ratio)
    }

    pub fn is_empty(&self) -> bool {
        self.ratio.is_none()
    }
}
