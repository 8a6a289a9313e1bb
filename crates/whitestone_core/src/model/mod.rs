//! Domain model for logged stones.
//!
//! # Responsibility
//! - Define canonical data structures used by the store and analytics.
//!
//! # Invariants
//! - Every stone is identified by a stable `StoneId`.
//! - All grouping reads the cached `DayKey`, never the raw timestamp.

pub mod day_key;
pub mod stone;
