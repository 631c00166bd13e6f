use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::models::{RangeStatus, ScheduleRange};

/// Read-only view over the declared schedule ranges. The engine never mutates
/// these rows; schedule management lives elsewhere.
pub struct ScheduleRegistry {
    pool: SqlitePool,
}

impl ScheduleRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Bookable windows for one professional and date, ordered by start time.
    pub async fn active_ranges(
        &self,
        professional_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<ScheduleRange>, sqlx::Error> {
        self.ranges_with_status(professional_id, date, RangeStatus::Active)
            .await
    }

    /// Explicit exclusions for one professional and date, ordered by start
    /// time. Callers must test against every element; ranges are not merged.
    pub async fn inactive_ranges(
        &self,
        professional_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<ScheduleRange>, sqlx::Error> {
        self.ranges_with_status(professional_id, date, RangeStatus::Inactive)
            .await
    }

    async fn ranges_with_status(
        &self,
        professional_id: i64,
        date: NaiveDate,
        status: RangeStatus,
    ) -> Result<Vec<ScheduleRange>, sqlx::Error> {
        debug!(
            "fetching {:?} ranges for professional {} on {}",
            status, professional_id, date
        );

        sqlx::query_as::<_, ScheduleRange>(
            "SELECT id, professional_id, date, start_time, end_time, status
             FROM schedule_ranges
             WHERE professional_id = ? AND date = ? AND status = ?
             ORDER BY start_time ASC",
        )
        .bind(professional_id)
        .bind(date)
        .bind(status)
        .fetch_all(&self.pool)
        .await
    }
}
