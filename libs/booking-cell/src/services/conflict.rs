use chrono::{NaiveDate, NaiveTime};

use schedule_cell::models::Interval;

use crate::models::Booking;

/// True when the requested slot overlaps any inactive range declared for the
/// professional on that date. An exclusion vetoes the slot even when it lies
/// outside every active window.
pub async fn blocked_by_inactive_range(
    executor: impl sqlx::SqliteExecutor<'_>,
    professional_id: i64,
    date: NaiveDate,
    slot: Interval,
) -> Result<bool, sqlx::Error> {
    let ranges: Vec<(NaiveTime, NaiveTime)> = sqlx::query_as(
        "SELECT start_time, end_time FROM schedule_ranges
         WHERE professional_id = ? AND date = ? AND status = 'inactive'
         ORDER BY start_time ASC",
    )
    .bind(professional_id)
    .bind(date)
    .fetch_all(executor)
    .await?;

    Ok(ranges
        .into_iter()
        .filter_map(|(start, end)| Interval::new(start, end))
        .any(|range| slot.overlaps(&range)))
}

/// Id of an existing booking whose interval overlaps the requested slot, if
/// any. Bookings without a computed end time are skipped; `exclude_booking_id`
/// lets an update ignore the row being moved.
pub async fn find_overlapping_booking(
    executor: impl sqlx::SqliteExecutor<'_>,
    professional_id: i64,
    date: NaiveDate,
    slot: Interval,
    exclude_booking_id: Option<i64>,
) -> Result<Option<i64>, sqlx::Error> {
    let bookings: Vec<Booking> = sqlx::query_as::<_, Booking>(
        "SELECT * FROM bookings
         WHERE professional_id = ? AND date = ? AND end_time IS NOT NULL
         ORDER BY start_time ASC",
    )
    .bind(professional_id)
    .bind(date)
    .fetch_all(executor)
    .await?;

    Ok(bookings.into_iter().find_map(|booking| {
        if exclude_booking_id == Some(booking.id) {
            return None;
        }
        let taken = booking.interval()?;
        slot.overlaps(&taken).then_some(booking.id)
    }))
}
