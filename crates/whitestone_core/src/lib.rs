//! Core event log and temporal analytics for WhiteStone.
//! This crate is the single source of truth for stone records and the
//! day-bucketed aggregates derived from them.

pub mod analytics;
pub mod calendar;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use analytics::buckets::{CategoryTotals, DayBucket, DayBuckets, DaySummary};
pub use analytics::grid::{GridCell, MonthGrid};
pub use analytics::ratio::{intensity, ratio, RatioCell};
pub use calendar::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, CoreConfig, DatabaseLocation};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::day_key::{day_key, parse_day_key, DayKey, DayKeyError};
pub use model::stone::{Stone, StoneId, StoneKind, StoneValidationError};
pub use repo::stone_repo::{RepoError, RepoResult, SqliteStoneRepository, StoneRepository};
pub use service::stone_service::{StoneEdit, StoneService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
