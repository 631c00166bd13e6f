use chrono::{NaiveDate, NaiveTime};
use sqlx::SqlitePool;
use tracing::debug;

use crate::models::{add_minutes, AvailabilityError, AvailableSlot, Interval, Service};
use crate::services::registry::ScheduleRegistry;

/// Computes the bookable slots for a professional/date/service combination.
/// A pure function of its inputs plus current store state; nothing is cached
/// across calls.
pub struct AvailabilityService {
    pool: SqlitePool,
    registry: ScheduleRegistry,
}

impl AvailabilityService {
    pub fn new(pool: SqlitePool) -> Self {
        let registry = ScheduleRegistry::new(pool.clone());
        Self { pool, registry }
    }

    /// Candidate slots inside the professional's working window, minus those
    /// colliding with an exclusion or an existing booking, in chronological
    /// order.
    pub async fn get_available_slots(
        &self,
        professional_id: i64,
        date: &str,
        service_id: i64,
    ) -> Result<Vec<AvailableSlot>, AvailabilityError> {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| AvailabilityError::InvalidDateFormat(date.to_string()))?;

        let service = self
            .fetch_service(service_id)
            .await?
            .ok_or(AvailabilityError::ServiceNotFound(service_id))?;
        if service.duration_minutes <= 0 {
            return Err(AvailabilityError::InvalidDuration(service.duration_minutes));
        }

        let active = self.registry.active_ranges(professional_id, date).await?;
        // One canonical working window per day; when several are declared,
        // only the earliest-starting one is honored.
        let Some(window_row) = active.first() else {
            debug!(
                "no active ranges for professional {} on {}",
                professional_id, date
            );
            return Ok(vec![]);
        };
        let window = window_row
            .interval()
            .ok_or(AvailabilityError::InvalidRange)?;

        let exclusions: Vec<Interval> = self
            .registry
            .inactive_ranges(professional_id, date)
            .await?
            .iter()
            .filter_map(|range| range.interval())
            .collect();

        // The day's committed bookings, fetched once; candidates are tested
        // against this set in memory.
        let booked = self.booked_intervals(professional_id, date).await?;

        let mut slots = Vec::new();
        let mut cursor = window.start;
        while let Some(slot_end) = add_minutes(cursor, service.duration_minutes) {
            // trailing partial slots are dropped, not truncated
            if slot_end > window.end {
                break;
            }
            let candidate = Interval {
                start: cursor,
                end: slot_end,
            };

            let blocked = exclusions.iter().any(|range| candidate.overlaps(range))
                || booked.iter().any(|taken| candidate.overlaps(taken));
            if !blocked {
                slots.push(AvailableSlot {
                    start: candidate.start.format("%-I:%M %p").to_string(),
                    end: candidate.end.format("%-I:%M %p").to_string(),
                    start_24: candidate.start.format("%H:%M:%S").to_string(),
                });
            }

            // the walk advances one full step whether or not the candidate survived
            cursor = slot_end;
        }

        debug!(
            "{} slots available for professional {} on {}",
            slots.len(),
            professional_id,
            date
        );
        Ok(slots)
    }

    async fn booked_intervals(
        &self,
        professional_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Interval>, AvailabilityError> {
        // Bookings without a computed end time are a legacy state and never
        // count as occupied.
        let rows: Vec<(NaiveTime, NaiveTime)> = sqlx::query_as(
            "SELECT start_time, end_time FROM bookings
             WHERE professional_id = ? AND date = ? AND end_time IS NOT NULL
             ORDER BY start_time ASC",
        )
        .bind(professional_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(start, end)| Interval::new(start, end))
            .collect())
    }

    async fn fetch_service(&self, id: i64) -> Result<Option<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            "SELECT id, name, description, duration_minutes FROM services WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
