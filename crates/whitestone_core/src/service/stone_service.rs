//! Stone log use-case service.
//!
//! # Responsibility
//! - Log, edit, delete and query stones on behalf of UI callers.
//! - Stamp day keys with the clock's timezone on every timestamp write.
//! - Serve display-ready aggregates recomputed from fresh snapshots.
//!
//! # Invariants
//! - Writers are serialized by `write_lock`; `edit_stone` read-modify-write
//!   never interleaves with another writer.
//! - Aggregate entry points never fail: an unavailable store reads as an
//!   empty snapshot.
//! - Aggregates select rows by stored day key, the same key they bucket by,
//!   so every view agrees after a timezone change.
//! - Notes are user text and never reach the log.

use crate::analytics::buckets::{
    bucket_by_day, bucket_for, CategoryTotals, DayBucket, DayBuckets, DaySummary,
};
use crate::analytics::grid::{build_month_grid, past_weeks, MonthGrid};
use crate::analytics::streak::current_streak;
use crate::analytics::trend::{trend_window, window_start, MAX_TREND_WINDOW_DAYS};
use crate::calendar::{first_of_month, last_of_month, local_date, offset_month, Clock, SystemClock};
use crate::db::DbError;
use crate::model::day_key::DayKey;
use crate::model::stone::{Stone, StoneId, StoneKind};
use crate::repo::stone_repo::{RepoError, RepoResult, StoneRepository};
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, warn};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

/// Changes applied by `edit_stone`; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoneEdit {
    /// Replacement note; an empty string clears it.
    pub note: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Stone log facade over a repository and a clock.
pub struct StoneService<R: StoneRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
    write_lock: Mutex<()>,
}

impl<R: StoneRepository> StoneService<R, SystemClock> {
    /// Creates a service on the device clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: StoneRepository, C: Clock> StoneService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self {
            repo,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Today's day key in the clock's timezone.
    pub fn today(&self) -> DayKey {
        DayKey::from_date(self.clock.today())
    }

    /// Logs a stone at the current instant.
    pub fn log_stone(&self, kind: StoneKind, note: Option<String>) -> RepoResult<Stone> {
        self.log_stone_at(kind, note, self.clock.now())
    }

    /// Logs a stone at an explicit instant.
    pub fn log_stone_at(
        &self,
        kind: StoneKind,
        note: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> RepoResult<Stone> {
        let stone = Stone::new(kind, note, timestamp, &self.clock.timezone()).inspect_err(|err| {
            warn!("event=stone_log module=service status=error kind={kind} error={err}");
        })?;
        let _guard = self.lock_writes()?;
        self.repo.insert_stone(&stone).inspect_err(|err| {
            warn!("event=stone_log module=service status=error kind={kind} error={err}");
        })?;
        info!(
            "event=stone_log module=service status=ok stone_id={} kind={} day_key={}",
            stone.id(),
            kind,
            stone.day_key()
        );
        Ok(stone)
    }

    /// Applies `edit` to an existing stone and returns the stored result.
    ///
    /// A new timestamp always restamps the day key.
    pub fn edit_stone(&self, id: StoneId, edit: &StoneEdit) -> RepoResult<Stone> {
        let _guard = self.lock_writes()?;
        let mut stone = self.repo.get_stone(id)?.ok_or(RepoError::NotFound(id))?;
        let previous_day = stone.day_key();

        if let Some(note) = &edit.note {
            stone.set_note(Some(note.clone()));
        }
        if let Some(timestamp) = edit.timestamp {
            stone.reschedule(timestamp, &self.clock.timezone())?;
        }

        self.repo.update_stone(&stone)?;
        info!(
            "event=stone_edit module=service status=ok stone_id={id} note_changed={} day_key_from={previous_day} day_key_to={}",
            edit.note.is_some(),
            stone.day_key()
        );
        Ok(stone)
    }

    pub fn delete_stone(&self, id: StoneId) -> RepoResult<()> {
        let _guard = self.lock_writes()?;
        self.repo.delete_stone(id)?;
        info!("event=stone_delete module=service status=ok stone_id={id}");
        Ok(())
    }

    pub fn get_stone(&self, id: StoneId) -> RepoResult<Option<Stone>> {
        self.repo.get_stone(id)
    }

    /// Stones in `[start, end)`, timestamp ascending, insertion-order ties.
    pub fn stones_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepoResult<Vec<Stone>> {
        self.repo.list_range(start, end)
    }

    pub fn all_stones(&self) -> RepoResult<Vec<Stone>> {
        self.repo.list_all()
    }

    pub fn stones_on_day(&self, day_key: DayKey) -> RepoResult<Vec<Stone>> {
        self.repo.list_day(day_key)
    }

    /// Counts and ratio for one day.
    pub fn day_summary(&self, day_key: DayKey) -> DaySummary {
        let stones = self.snapshot("day_summary", |repo| repo.list_day(day_key));
        DaySummary::from(bucket_for(&bucket_by_day(&stones), day_key))
    }

    pub fn today_summary(&self) -> DaySummary {
        self.day_summary(self.today())
    }

    /// Heat-map grid for the local month containing `reference`.
    pub fn month_grid(&self, reference: DateTime<Utc>) -> MonthGrid {
        self.grid_for_month(local_date(reference, &self.clock.timezone()))
    }

    /// Grid `delta` months away from the current month (negative = past).
    pub fn month_grid_offset(&self, delta: i32) -> MonthGrid {
        let today = self.clock.today();
        match offset_month(today, delta) {
            Ok(month) => self.grid_for_month(month),
            Err(err) => {
                warn!("event=month_grid module=service status=error delta={delta} error={err}");
                build_month_grid(today, &DayBuckets::new())
            }
        }
    }

    fn grid_for_month(&self, month: NaiveDate) -> MonthGrid {
        let first = DayKey::from_date(first_of_month(month));
        let last = DayKey::from_date(last_of_month(month));
        let stones = self.snapshot("month_grid", |repo| repo.list_day_range(first, last));
        build_month_grid(month, &bucket_by_day(&stones))
    }

    /// Consecutive on-track days ending today.
    pub fn current_streak(&self) -> u32 {
        let stones = self.snapshot("current_streak", |repo| repo.list_all());
        current_streak(self.today(), &bucket_by_day(&stones))
    }

    /// `window_days` buckets ending today, oldest first.
    ///
    /// Windows longer than `MAX_TREND_WINDOW_DAYS` are clamped.
    pub fn trend(&self, window_days: u32) -> Vec<DayBucket> {
        if window_days > MAX_TREND_WINDOW_DAYS {
            warn!(
                "event=trend module=service status=clamped requested_days={window_days} max_days={MAX_TREND_WINDOW_DAYS}"
            );
        }
        let today = self.today();
        let stones = if window_days == 0 {
            Vec::new()
        } else {
            let first = window_start(today, window_days);
            self.snapshot("trend", |repo| repo.list_day_range(first, today))
        };
        trend_window(today, window_days, &bucket_by_day(&stones))
    }

    /// Per-day buckets for Sunday-first weeks ending with the current one.
    pub fn past_weeks(&self, weeks: u32) -> Vec<[DayBucket; 7]> {
        let rows = past_weeks(self.clock.today(), weeks);
        let buckets: DayBuckets = match rows.first().zip(rows.last()) {
            Some((first, last)) => {
                let stones =
                    self.snapshot("past_weeks", |repo| repo.list_day_range(first[0], last[6]));
                bucket_by_day(&stones)
            }
            None => DayBuckets::new(),
        };
        rows.into_iter()
            .map(|row| row.map(|day_key| bucket_for(&buckets, day_key)))
            .collect()
    }

    /// All-time counts per kind.
    pub fn totals(&self) -> CategoryTotals {
        match self.repo.count_by_kind() {
            Ok(totals) => totals,
            Err(err) => {
                warn!("event=snapshot_read module=service status=error op=totals error={err}");
                CategoryTotals::default()
            }
        }
    }

    fn lock_writes(&self) -> RepoResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| RepoError::StoreUnavailable(DbError::ConnectionPoisoned))
    }

    fn snapshot(
        &self,
        op: &'static str,
        read: impl FnOnce(&R) -> RepoResult<Vec<Stone>>,
    ) -> Vec<Stone> {
        let started_at = Instant::now();
        match read(&self.repo) {
            Ok(stones) => {
                debug!(
                    "event=snapshot_read module=service status=ok op={op} rows={} duration_ms={}",
                    stones.len(),
                    started_at.elapsed().as_millis()
                );
                stones
            }
            Err(err) => {
                warn!("event=snapshot_read module=service status=error op={op} error={err}");
                Vec::new()
            }
        }
    }
}
