//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe where stones are stored, how logging is set up, and the
//!   default analytics windows.
//! - Validate values before any store or logger is opened.
//!
//! # Invariants
//! - Missing fields fall back to `CoreConfig::default()`.
//! - Window sizes are at least one day / one week and at most the
//!   analytics caps.

use crate::analytics::grid::MAX_PAST_WEEKS;
use crate::analytics::trend::{DEFAULT_TREND_WINDOW_DAYS, MAX_TREND_WINDOW_DAYS};
use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging, LoggingError};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DEFAULT_PAST_WEEKS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub database: DatabaseLocation,
    /// Falls back to `default_log_level()` when unset.
    pub log_level: Option<String>,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub trend_window_days: u32,
    pub past_weeks: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database: DatabaseLocation::Memory,
            log_level: None,
            log_dir: None,
            trend_window_days: DEFAULT_TREND_WINDOW_DAYS,
            past_weeks: DEFAULT_PAST_WEEKS,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    InvalidValue { field: &'static str, message: String },
    Logging(LoggingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::InvalidValue { field, message } => write!(f, "invalid `{field}`: {message}"),
            Self::Logging(err) => write!(f, "logging setup failed: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_window("trend_window_days", self.trend_window_days, MAX_TREND_WINDOW_DAYS)?;
        check_window("past_weeks", self.past_weeks, MAX_PAST_WEEKS)?;
        if let DatabaseLocation::File(path) = &self.database {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "database",
                    message: "file path cannot be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }

    /// Starts file logging when `log_dir` is configured.
    pub fn init_logging(&self) -> Result<bool, ConfigError> {
        let Some(dir) = &self.log_dir else {
            return Ok(false);
        };
        let dir = dir.to_str().ok_or_else(|| ConfigError::InvalidValue {
            field: "log_dir",
            message: "path must be valid UTF-8".to_string(),
        })?;
        init_logging(self.effective_log_level(), dir).map_err(ConfigError::Logging)?;
        Ok(true)
    }

    /// Opens the configured database with migrations applied.
    pub fn open_connection(&self) -> DbResult<Connection> {
        match &self.database {
            DatabaseLocation::Memory => open_db_in_memory(),
            DatabaseLocation::File(path) => open_db(path),
        }
    }
}

fn check_window(field: &'static str, value: u32, max: u32) -> Result<(), ConfigError> {
    if (1..=max).contains(&value) {
        return Ok(());
    }
    Err(ConfigError::InvalidValue {
        field,
        message: format!("must be between 1 and {max}, got {value}"),
    })
}
