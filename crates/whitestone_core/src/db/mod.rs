//! Stone database bootstrap.
//!
//! Every connection handed to `SqliteStoneRepository` comes from here, with
//! the `stones` table and its timestamp/day-key indexes already in place.
//! The schema version lives in `PRAGMA user_version`; a file written by a
//! newer build is refused rather than downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was migrated by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A thread panicked while holding the connection or write lock.
    ConnectionPoisoned,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "stone database schema v{db_version} is newer than this build (v{latest_supported})"
            ),
            Self::ConnectionPoisoned => {
                write!(f, "stone store lock poisoned by a panicked writer")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::ConnectionPoisoned => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_mismatch_names_both_versions() {
        let err = DbError::UnsupportedSchemaVersion {
            db_version: 7,
            latest_supported: 1,
        };
        assert_eq!(
            err.to_string(),
            "stone database schema v7 is newer than this build (v1)"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn poisoned_lock_has_no_underlying_source() {
        let err = DbError::ConnectionPoisoned;
        assert!(err.to_string().contains("poisoned"));
        assert!(err.source().is_none());
    }
}
