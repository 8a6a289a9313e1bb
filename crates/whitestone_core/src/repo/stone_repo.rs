//! Stone repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist stone records and read them back in timestamp order.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Listing order is `timestamp ASC`, then insertion order.
//! - Instant range queries are half-open and reject `end <= start`.
//! - Day range queries select on the stored `day_key`, never on instants.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - `kind` is never rewritten by `update_stone`.

use crate::analytics::buckets::CategoryTotals;
use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::day_key::DayKey;
use crate::model::stone::{Stone, StoneId, StoneKind, StoneValidationError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Params, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const STONE_SELECT_SQL: &str = "SELECT
    uuid,
    kind,
    timestamp_ms,
    note,
    day_key
FROM stones";

const STONE_ORDER_SQL: &str = "ORDER BY timestamp_ms ASC, seq ASC";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    /// The persistence medium failed; nothing was written.
    StoreUnavailable(DbError),
    NotFound(StoneId),
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// The requested write would produce a stone the store cannot hold.
    InvalidStone(StoneValidationError),
    /// Connection schema is missing or older than this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreUnavailable(err) => write!(f, "stone store unavailable: {err}"),
            Self::NotFound(id) => write!(f, "stone not found: {id}"),
            Self::InvalidRange { start, end } => write!(
                f,
                "invalid range: end {} must be after start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            ),
            Self::InvalidStone(err) => write!(f, "invalid stone: {err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted stone data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable(err) => Some(err),
            Self::InvalidStone(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::StoreUnavailable(value)
    }
}

impl From<StoneValidationError> for RepoError {
    fn from(value: StoneValidationError) -> Self {
        Self::InvalidStone(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::StoreUnavailable(DbError::Sqlite(value))
    }
}

/// Repository interface for stone persistence.
pub trait StoneRepository {
    fn insert_stone(&self, stone: &Stone) -> RepoResult<StoneId>;
    /// Rewrites note, timestamp and day key of an existing stone.
    fn update_stone(&self, stone: &Stone) -> RepoResult<()>;
    fn delete_stone(&self, id: StoneId) -> RepoResult<()>;
    fn get_stone(&self, id: StoneId) -> RepoResult<Option<Stone>>;
    /// Stones with `start <= timestamp < end`.
    fn list_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> RepoResult<Vec<Stone>>;
    fn list_all(&self) -> RepoResult<Vec<Stone>>;
    fn list_day(&self, day_key: DayKey) -> RepoResult<Vec<Stone>>;
    /// Stones whose stored day key lies in `first..=last`.
    fn list_day_range(&self, first: DayKey, last: DayKey) -> RepoResult<Vec<Stone>>;
    fn count_by_kind(&self) -> RepoResult<CategoryTotals>;
}

/// SQLite-backed stone repository.
///
/// Owns its connection behind a mutex so one repository can serve several
/// threads; each statement runs under the lock.
pub struct SqliteStoneRepository {
    conn: Mutex<Connection>,
}

impl SqliteStoneRepository {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        let actual_version = schema_version(&conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RepoError::StoreUnavailable(DbError::ConnectionPoisoned))
    }

    fn query_stones<P: Params>(&self, sql: &str, params: P) -> RepoResult<Vec<Stone>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut stones = Vec::new();
        while let Some(row) = rows.next()? {
            stones.push(parse_stone_row(row)?);
        }
        Ok(stones)
    }
}

impl StoneRepository for SqliteStoneRepository {
    fn insert_stone(&self, stone: &Stone) -> RepoResult<StoneId> {
        self.lock()?.execute(
            "INSERT INTO stones (uuid, kind, timestamp_ms, note, day_key)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                stone.id().to_string(),
                stone.kind().as_str(),
                stone.timestamp().timestamp_millis(),
                stone.note(),
                stone.day_key().to_string(),
            ],
        )?;
        Ok(stone.id())
    }

    fn update_stone(&self, stone: &Stone) -> RepoResult<()> {
        let changed = self.lock()?.execute(
            "UPDATE stones
             SET
                timestamp_ms = ?1,
                note = ?2,
                day_key = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?4;",
            params![
                stone.timestamp().timestamp_millis(),
                stone.note(),
                stone.day_key().to_string(),
                stone.id().to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(stone.id()));
        }
        Ok(())
    }

    fn delete_stone(&self, id: StoneId) -> RepoResult<()> {
        let changed = self
            .lock()?
            .execute("DELETE FROM stones WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn get_stone(&self, id: StoneId) -> RepoResult<Option<Stone>> {
        let mut stones = self.query_stones(
            &format!("{STONE_SELECT_SQL} WHERE uuid = ?1;"),
            [id.to_string()],
        )?;
        Ok(stones.pop())
    }

    fn list_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> RepoResult<Vec<Stone>> {
        if end <= start {
            return Err(RepoError::InvalidRange { start, end });
        }
        self.query_stones(
            &format!(
                "{STONE_SELECT_SQL}
                 WHERE timestamp_ms >= ?1 AND timestamp_ms < ?2
                 {STONE_ORDER_SQL};"
            ),
            params![start.timestamp_millis(), end.timestamp_millis()],
        )
    }

    fn list_all(&self) -> RepoResult<Vec<Stone>> {
        self.query_stones(&format!("{STONE_SELECT_SQL} {STONE_ORDER_SQL};"), [])
    }

    fn list_day(&self, day_key: DayKey) -> RepoResult<Vec<Stone>> {
        self.query_stones(
            &format!("{STONE_SELECT_SQL} WHERE day_key = ?1 {STONE_ORDER_SQL};"),
            [day_key.to_string()],
        )
    }

    fn list_day_range(&self, first: DayKey, last: DayKey) -> RepoResult<Vec<Stone>> {
        if last < first {
            return Ok(Vec::new());
        }
        // Four-digit zero-padded keys compare lexically in calendar order.
        self.query_stones(
            &format!(
                "{STONE_SELECT_SQL}
                 WHERE day_key >= ?1 AND day_key <= ?2
                 {STONE_ORDER_SQL};"
            ),
            [first.to_string(), last.to_string()],
        )
    }

    fn count_by_kind(&self) -> RepoResult<CategoryTotals> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT kind, COUNT(*) FROM stones GROUP BY kind;")?;
        let mut rows = stmt.query([])?;
        let mut totals = CategoryTotals::default();
        while let Some(row) = rows.next()? {
            let kind_text: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            let count = u64::try_from(count).map_err(|_| {
                RepoError::InvalidData(format!("negative count `{count}` for kind `{kind_text}`"))
            })?;
            match parse_kind(&kind_text)? {
                StoneKind::White => totals.white = count,
                StoneKind::Black => totals.black = count,
            }
        }
        Ok(totals)
    }
}

fn parse_stone_row(row: &Row<'_>) -> RepoResult<Stone> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in stones.uuid"))
    })?;

    let kind_text: String = row.get("kind")?;
    let kind = parse_kind(&kind_text)?;

    let timestamp_ms: i64 = row.get("timestamp_ms")?;
    let timestamp = DateTime::from_timestamp_millis(timestamp_ms).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "timestamp `{timestamp_ms}` out of range in stones.timestamp_ms"
        ))
    })?;

    let day_key_text: String = row.get("day_key")?;
    let day_key = DayKey::parse(&day_key_text)
        .map_err(|err| RepoError::InvalidData(format!("{err} in stones.day_key")))?;

    Ok(Stone::from_persisted(
        id,
        kind,
        timestamp,
        row.get("note")?,
        day_key,
    ))
}

fn parse_kind(value: &str) -> RepoResult<StoneKind> {
    StoneKind::parse(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid stone kind `{value}`")))
}
