use chrono::{Datelike, NaiveDate, NaiveTime};
use sqlx::SqlitePool;
use tracing::debug;

use crate::models::{BookingDetails, BookingError, BookingOverview};

const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Read-only booking lookups. A reference number is enough to retrieve a
/// booking without authenticating; absence is a normal outcome and comes back
/// as `None`, never as an error.
pub struct BookingQueryService {
    pool: SqlitePool,
}

impl BookingQueryService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_phone_and_reference(
        &self,
        phone: &str,
        reference: &str,
    ) -> Result<Option<BookingDetails>, BookingError> {
        debug!("looking up booking by phone and reference {}", reference);

        let row: Option<DetailRow> = sqlx::query_as(
            "SELECT b.id, b.date, b.start_time, b.end_time, b.reference_number,
                    b.payment_status, b.appointment_status,
                    cl.name AS client_name, cl.phone AS client_phone,
                    cl.birth_date AS client_birth_date,
                    s.name AS service_name, s.duration_minutes,
                    p.name AS professional_name
             FROM bookings b
             JOIN clients cl ON cl.id = b.client_id
             JOIN services s ON s.id = b.service_id
             JOIN professionals p ON p.id = b.professional_id
             WHERE cl.phone = ? AND b.reference_number = ?",
        )
        .bind(phone)
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DetailRow::into_details))
    }

    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<BookingDetails>, BookingError> {
        debug!("looking up booking by reference {}", reference);

        let row: Option<DetailRow> = sqlx::query_as(
            "SELECT b.id, b.date, b.start_time, b.end_time, b.reference_number,
                    b.payment_status, b.appointment_status,
                    cl.name AS client_name, cl.phone AS client_phone,
                    cl.birth_date AS client_birth_date,
                    s.name AS service_name, s.duration_minutes,
                    p.name AS professional_name
             FROM bookings b
             JOIN clients cl ON cl.id = b.client_id
             JOIN services s ON s.id = b.service_id
             JOIN professionals p ON p.id = b.professional_id
             WHERE b.reference_number = ?",
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DetailRow::into_details))
    }

    pub async fn client_birth_date_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<NaiveDate>, BookingError> {
        let row: Option<(Option<NaiveDate>,)> =
            sqlx::query_as("SELECT birth_date FROM clients WHERE phone = ?")
                .bind(phone)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.and_then(|(birth_date,)| birth_date))
    }

    /// Administrative listing of every booking with its joined display names,
    /// ordered chronologically. Client birth dates are only included on
    /// request.
    pub async fn list_with_details(
        &self,
        include_client: bool,
    ) -> Result<Vec<BookingOverview>, BookingError> {
        let rows = sqlx::query_as::<_, BookingOverview>(
            "SELECT b.id, b.client_id, b.service_id, b.professional_id, b.date,
                    b.start_time, b.end_time, b.reference_number,
                    b.appointment_status, b.payment_status,
                    cl.name AS client_name, cl.phone AS client_phone,
                    CASE WHEN ? THEN cl.birth_date ELSE NULL END AS client_birth_date,
                    s.name AS service_name,
                    p.name AS professional_name
             FROM bookings b
             LEFT JOIN clients cl ON cl.id = b.client_id
             LEFT JOIN services s ON s.id = b.service_id
             LEFT JOIN professionals p ON p.id = b.professional_id
             ORDER BY b.date ASC, b.start_time ASC",
        )
        .bind(include_client)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[derive(sqlx::FromRow)]
struct DetailRow {
    id: i64,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: Option<NaiveTime>,
    reference_number: Option<String>,
    payment_status: String,
    appointment_status: String,
    client_name: String,
    client_phone: String,
    client_birth_date: Option<NaiveDate>,
    service_name: String,
    duration_minutes: i64,
    professional_name: String,
}

impl DetailRow {
    fn into_details(self) -> BookingDetails {
        BookingDetails {
            id: self.id,
            reference_number: self.reference_number,
            date: self.date,
            date_display: format_date_long(self.date),
            start_time: format_time_display(self.start_time),
            end_time: self.end_time.map(format_time_display),
            client_name: self.client_name,
            client_phone: self.client_phone,
            client_birth_date: self.client_birth_date,
            service_name: self.service_name,
            service_duration_minutes: self.duration_minutes,
            professional_name: self.professional_name,
            payment_status: self.payment_status,
            appointment_status: self.appointment_status,
        }
    }
}

/// Long-form date shown to clients, e.g. "12 de marzo de 2026".
fn format_date_long(date: NaiveDate) -> String {
    format!(
        "{} de {} de {}",
        date.day(),
        MONTH_NAMES[date.month0() as usize],
        date.year()
    )
}

fn format_time_display(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}
