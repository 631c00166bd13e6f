// libs/schedule-cell/src/models.rs
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// ==============================================================================
// INTERVAL MODEL
// ==============================================================================

/// Half-open time range within a single day: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Interval {
    /// `None` unless `start < end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Half-open overlap test. Touching endpoints do not overlap, which is
    /// what allows back-to-back bookings.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Pure time arithmetic. Returns `None` when the result would cross midnight;
/// no calendar rollover is defined for this engine.
pub fn add_minutes(time: NaiveTime, minutes: i64) -> Option<NaiveTime> {
    let (result, wrapped_seconds) = time.overflowing_add_signed(Duration::minutes(minutes));
    (wrapped_seconds == 0).then_some(result)
}

// ==============================================================================
// SCHEDULE REGISTRY MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RangeStatus {
    /// Bookable working window.
    Active,
    /// Explicit exclusion; vetoes any slot or booking it overlaps.
    Inactive,
}

/// One declared range for a professional on a date, as stored. Ranges are not
/// normalized: overlapping ranges of the same status stay separate rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduleRange {
    pub id: i64,
    pub professional_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: RangeStatus,
}

impl ScheduleRange {
    /// Declared window as an interval; `None` for a corrupt row.
    pub fn interval(&self) -> Option<Interval> {
        Interval::new(self.start_time, self.end_time)
    }
}

// ==============================================================================
// CATALOG MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i64,
}

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

/// One bookable slot, formatted for display plus a 24-hour machine form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub start: String,
    pub end: String,
    #[serde(rename = "start24")]
    pub start_24: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Date must be formatted as YYYY-MM-DD, got {0}")]
    InvalidDateFormat(String),

    #[error("Service {0} not found")]
    ServiceNotFound(i64),

    #[error("Service duration is invalid: {0} minutes")]
    InvalidDuration(i64),

    #[error("Declared working window is invalid")]
    InvalidRange,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
