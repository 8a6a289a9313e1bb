//! Pure aggregations over a stone snapshot.
//!
//! # Responsibility
//! - Turn day-keyed stones into ratios, month grids, streaks and trends.
//!
//! # Invariants
//! - Every function is total and deterministic over its inputs.
//! - An empty snapshot yields `None` ratios, zero totals and a zero streak.

pub mod buckets;
pub mod grid;
pub mod ratio;
pub mod streak;
pub mod trend;
