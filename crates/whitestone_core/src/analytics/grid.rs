//! Month heat-map grid and week rows.
//!
//! # Invariants
//! - A month grid holds `leading_blanks + days_in_month` cells, blanks first.
//! - `leading_blanks` is the Monday = 0 weekday of the 1st (0..=6).
//! - Week rows always hold seven days, Sunday first.

use super::buckets::{bucket_for, DayBuckets};
use super::ratio::RatioCell;
use crate::calendar::{days_in_month, first_of_month, start_of_week, weekday_offset_of_first};
use crate::model::day_key::DayKey;
use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridCell {
    /// Padding before the 1st so it lines up with its weekday column.
    Blank,
    Day(DayCell),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayCell {
    /// Day of month, starting at 1.
    pub day: u32,
    pub cell: RatioCell,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGrid {
    pub first_day: NaiveDate,
    pub leading_blanks: u32,
    pub days_in_month: u32,
    pub cells: Vec<GridCell>,
}

impl MonthGrid {
    pub fn day_cells(&self) -> impl Iterator<Item = &DayCell> {
        self.cells.iter().filter_map(|cell| match cell {
            GridCell::Day(day) => Some(day),
            GridCell::Blank => None,
        })
    }
}

/// Builds the grid for the month containing `reference`.
pub fn build_month_grid(reference: NaiveDate, buckets: &DayBuckets) -> MonthGrid {
    let first_day = first_of_month(reference);
    let leading_blanks = weekday_offset_of_first(first_day);
    let days_in_month = days_in_month(first_day);

    let mut cells = Vec::with_capacity((leading_blanks + days_in_month) as usize);
    cells.extend((0..leading_blanks).map(|_| GridCell::Blank));
    cells.extend(
        first_day
            .iter_days()
            .take(days_in_month as usize)
            .map(|date| {
                let cell = bucket_for(buckets, DayKey::from_date(date)).ratio_cell();
                GridCell::Day(DayCell {
                    day: date.day(),
                    intensity: cell.intensity(),
                    cell,
                })
            }),
    );

    MonthGrid {
        first_day,
        leading_blanks,
        days_in_month,
        cells,
    }
}

/// Ten years of weekly rows.
pub const MAX_PAST_WEEKS: u32 = 522;

/// `weeks` Sunday-first rows of day keys, oldest first, ending with the
/// week that contains `today`. At most `MAX_PAST_WEEKS` rows.
pub fn past_weeks(today: NaiveDate, weeks: u32) -> Vec<[DayKey; 7]> {
    let current_week = start_of_week(today);
    (0..weeks.min(MAX_PAST_WEEKS))
        .rev()
        .filter_map(|weeks_back| {
            let start = current_week.checked_sub_days(Days::new(7 * u64::from(weeks_back)))?;
            let mut row = [DayKey::from_date(start); 7];
            for (offset, slot) in row.iter_mut().enumerate() {
                *slot = DayKey::from_date(start.checked_add_days(Days::new(offset as u64))?);
            }
            Some(row)
        })
        .collect()
}
