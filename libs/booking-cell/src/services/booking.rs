// libs/booking-cell/src/services/booking.rs
use chrono::NaiveDate;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use schedule_cell::models::{add_minutes, Interval, Service};
use shared_config::AppConfig;

use crate::models::{
    Booking, BookingError, CreateBookingRequest, CreatedBooking, DeleteOutcome,
    UpdateBookingRequest, DEFAULT_STATUS,
};
use crate::services::conflict;
use crate::services::locks::SlotLocks;

/// State-changing core of the engine. Every operation runs inside a single
/// transaction; a failure on any step rolls the whole operation back and no
/// partial client/booking/clinical-record state persists.
pub struct BookingService {
    pool: SqlitePool,
    locks: SlotLocks,
    strict_update_revalidation: bool,
}

impl BookingService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: SlotLocks::new(),
            strict_update_revalidation: false,
        }
    }

    /// Variant that re-runs the creation-time conflict checks whenever an
    /// update moves a booking in time or changes its service.
    pub fn with_strict_revalidation(pool: SqlitePool) -> Self {
        Self {
            strict_update_revalidation: true,
            ..Self::new(pool)
        }
    }

    /// Constructor driven by the application config.
    pub fn with_config(pool: SqlitePool, config: &AppConfig) -> Self {
        Self {
            strict_update_revalidation: config.strict_update_revalidation,
            ..Self::new(pool)
        }
    }

    /// Create a booking, upserting the client by phone and deriving the end
    /// time from the service duration. Fails without side effects when the
    /// slot collides with an exclusion or an existing booking.
    pub async fn create(
        &self,
        request: CreateBookingRequest,
    ) -> Result<CreatedBooking, BookingError> {
        let client_name = request
            .client_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or(BookingError::MissingField("client_name"))?;
        let client_phone = request
            .client_phone
            .as_deref()
            .filter(|phone| !phone.is_empty())
            .ok_or(BookingError::MissingField("client_phone"))?;
        let client_birth_date = request
            .client_birth_date
            .ok_or(BookingError::MissingField("client_birth_date"))?;
        let professional_id = request
            .professional_id
            .ok_or(BookingError::MissingField("professional_id"))?;
        let service_id = request
            .service_id
            .ok_or(BookingError::MissingField("service_id"))?;
        let date = request.date.ok_or(BookingError::MissingField("date"))?;
        let start_time = request
            .start_time
            .ok_or(BookingError::MissingField("start_time"))?;

        info!(
            "creating booking for professional {} on {} at {}",
            professional_id, date, start_time
        );

        let _slot_guard = self.locks.acquire(professional_id, date).await;
        let mut tx = self.pool.begin().await?;

        let client_id = upsert_client(&mut tx, client_name, client_phone, client_birth_date).await?;

        let service = fetch_service(&mut *tx, service_id)
            .await?
            .ok_or(BookingError::ServiceNotFound(service_id))?;
        if service.duration_minutes <= 0 {
            return Err(BookingError::InvalidDuration(service.duration_minutes));
        }

        let end_time = add_minutes(start_time, service.duration_minutes).ok_or_else(|| {
            BookingError::InvalidTime(format!(
                "{} plus {} minutes crosses midnight",
                start_time, service.duration_minutes
            ))
        })?;
        let slot = Interval {
            start: start_time,
            end: end_time,
        };

        if conflict::blocked_by_inactive_range(&mut *tx, professional_id, date, slot).await? {
            warn!(
                "professional {} has a blocked range over {} {}",
                professional_id, date, start_time
            );
            return Err(BookingError::ScheduleBlocked);
        }

        if conflict::find_overlapping_booking(&mut *tx, professional_id, date, slot, None)
            .await?
            .is_some()
        {
            warn!(
                "slot {} {} already taken for professional {}",
                date, start_time, professional_id
            );
            return Err(BookingError::SlotUnavailable);
        }

        let reference_number = request
            .reference_number
            .clone()
            .filter(|reference| !reference.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

        let booking = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (client_id, service_id, professional_id, date, start_time, end_time, reference_number)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(client_id)
        .bind(service_id)
        .bind(professional_id)
        .bind(date)
        .bind(start_time)
        .bind(end_time)
        .bind(&reference_number)
        .fetch_one(&mut *tx)
        .await?;

        let record_description = service
            .description
            .clone()
            .filter(|description| !description.is_empty())
            .unwrap_or_else(|| format!("Clinical record for {}", client_name));
        sqlx::query("INSERT INTO clinical_records (booking_id, description) VALUES (?, ?)")
            .bind(booking.id)
            .bind(&record_description)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            "booking {} created with reference {}",
            booking.id, reference_number
        );
        Ok(CreatedBooking {
            booking,
            clinical_record_created: true,
        })
    }

    /// Merge `patch` over the stored row and persist. Fields absent from the
    /// patch keep their stored value; a service change recomputes the end
    /// time from the new duration.
    pub async fn update(
        &self,
        id: i64,
        patch: UpdateBookingRequest,
    ) -> Result<Booking, BookingError> {
        if id <= 0 {
            return Err(BookingError::InvalidId);
        }
        debug!("updating booking {}", id);

        let current = self
            .fetch_booking(id)
            .await?
            .ok_or(BookingError::NotFound)?;

        let mut keys = vec![(current.professional_id, current.date)];
        keys.push((
            patch.professional_id.unwrap_or(current.professional_id),
            patch.date.unwrap_or(current.date),
        ));
        let _slot_guards = self.locks.acquire_all(keys).await;

        let mut tx = self.pool.begin().await?;

        // refetch under the lock; the row may have changed since the first read
        let current = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(BookingError::NotFound)?;

        let service_id = patch.service_id.unwrap_or(current.service_id);
        let professional_id = patch.professional_id.unwrap_or(current.professional_id);
        let date = patch.date.unwrap_or(current.date);
        let start_time = patch.start_time.unwrap_or(current.start_time);
        let reference_number = patch
            .reference_number
            .clone()
            .or_else(|| current.reference_number.clone());
        let appointment_status = merge_status(patch.appointment_status, &current.appointment_status);
        let payment_status = merge_status(patch.payment_status, &current.payment_status);

        let mut end_time = current.end_time;
        if patch.service_id.is_some_and(|new| new != current.service_id) {
            let service = fetch_service(&mut *tx, service_id)
                .await?
                .ok_or(BookingError::ServiceNotFound(service_id))?;
            if service.duration_minutes <= 0 {
                return Err(BookingError::InvalidDuration(service.duration_minutes));
            }
            end_time = Some(add_minutes(start_time, service.duration_minutes).ok_or_else(
                || {
                    BookingError::InvalidTime(format!(
                        "{} plus {} minutes crosses midnight",
                        start_time, service.duration_minutes
                    ))
                },
            )?);
        }

        let reschedules = patch.start_time.is_some()
            || patch.date.is_some()
            || patch.professional_id.is_some()
            || patch.service_id.is_some();
        if self.strict_update_revalidation && reschedules {
            if let Some(slot) = end_time.and_then(|end| Interval::new(start_time, end)) {
                if conflict::blocked_by_inactive_range(&mut *tx, professional_id, date, slot)
                    .await?
                {
                    warn!("update of booking {} lands on a blocked range", id);
                    return Err(BookingError::ScheduleBlocked);
                }
                if conflict::find_overlapping_booking(
                    &mut *tx,
                    professional_id,
                    date,
                    slot,
                    Some(id),
                )
                .await?
                .is_some()
                {
                    warn!("update of booking {} collides with another booking", id);
                    return Err(BookingError::SlotUnavailable);
                }
            }
        }

        let result = sqlx::query(
            "UPDATE bookings
             SET client_id = ?, service_id = ?, professional_id = ?, date = ?,
                 start_time = ?, end_time = ?, reference_number = ?,
                 appointment_status = ?, payment_status = ?
             WHERE id = ?",
        )
        .bind(current.client_id) // preserved from the stored row, never patched
        .bind(service_id)
        .bind(professional_id)
        .bind(date)
        .bind(start_time)
        .bind(end_time)
        .bind(&reference_number)
        .bind(&appointment_status)
        .bind(&payment_status)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(BookingError::NotFound);
        }

        let refreshed = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("booking {} updated", id);
        Ok(refreshed)
    }

    /// Delete a booking; the dependent clinical record goes with it through
    /// the cascade. There is no undelete.
    pub async fn delete(&self, id: i64) -> Result<DeleteOutcome, BookingError> {
        if id <= 0 {
            return Err(BookingError::InvalidId);
        }
        debug!("deleting booking {}", id);

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM bookings WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(BookingError::NotFound);
        }
        tx.commit().await?;

        info!("booking {} deleted", id);
        Ok(DeleteOutcome {
            message: "Booking and its clinical record deleted".to_string(),
        })
    }

    async fn fetch_booking(&self, id: i64) -> Result<Option<Booking>, BookingError> {
        Ok(
            sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }
}

fn merge_status(patched: Option<String>, stored: &str) -> String {
    match patched {
        Some(value) if !value.is_empty() => value,
        _ if !stored.is_empty() => stored.to_string(),
        _ => DEFAULT_STATUS.to_string(),
    }
}

/// Resolve the client id for a phone number, inserting the client when it is
/// unknown. The UNIQUE constraint on phone plus the conflict-tolerant insert
/// make two first-time bookings racing on the same number converge on a
/// single row.
async fn upsert_client(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    phone: &str,
    birth_date: NaiveDate,
) -> Result<i64, BookingError> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM clients WHERE phone = ?")
        .bind(phone)
        .fetch_optional(&mut **tx)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    sqlx::query(
        "INSERT INTO clients (name, phone, birth_date) VALUES (?, ?, ?)
         ON CONFLICT(phone) DO NOTHING",
    )
    .bind(name)
    .bind(phone)
    .bind(birth_date)
    .execute(&mut **tx)
    .await?;

    let (id,): (i64,) = sqlx::query_as("SELECT id FROM clients WHERE phone = ?")
        .bind(phone)
        .fetch_one(&mut **tx)
        .await?;
    Ok(id)
}

async fn fetch_service(
    executor: impl sqlx::SqliteExecutor<'_>,
    id: i64,
) -> Result<Option<Service>, sqlx::Error> {
    sqlx::query_as::<_, Service>(
        "SELECT id, name, description, duration_minutes FROM services WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}
