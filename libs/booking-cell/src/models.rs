// libs/booking-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use schedule_cell::models::Interval;

/// Status value applied when neither the caller nor the stored row carries one.
pub const DEFAULT_STATUS: &str = "Pendiente";

// ==============================================================================
// CORE BOOKING MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: i64,
    pub client_id: i64,
    pub service_id: i64,
    pub professional_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub reference_number: Option<String>,
    pub payment_status: String,
    pub appointment_status: String,
}

impl Booking {
    /// Occupied interval, when the end time has been computed. Bookings
    /// without one are invisible to every conflict check.
    pub fn interval(&self) -> Option<Interval> {
        self.end_time
            .and_then(|end| Interval::new(self.start_time, end))
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Creation payload. Every field except `reference_number` is required; the
/// first absent one is reported by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub client_birth_date: Option<NaiveDate>,
    pub professional_id: Option<i64>,
    pub service_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub reference_number: Option<String>,
}

/// Partial update. Fields present here win; everything else keeps its stored
/// value, so foreign keys such as the client can never be nulled out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBookingRequest {
    pub service_id: Option<i64>,
    pub professional_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub reference_number: Option<String>,
    pub appointment_status: Option<String>,
    pub payment_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedBooking {
    #[serde(flatten)]
    pub booking: Booking,
    pub clinical_record_created: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub message: String,
}

// ==============================================================================
// LOOKUP MODELS
// ==============================================================================

/// Fully joined booking as shown to a client retrieving it by reference
/// number. Times are display-formatted at the edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingDetails {
    pub id: i64,
    pub reference_number: Option<String>,
    pub date: NaiveDate,
    pub date_display: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub client_name: String,
    pub client_phone: String,
    pub client_birth_date: Option<NaiveDate>,
    pub service_name: String,
    pub service_duration_minutes: i64,
    pub professional_name: String,
    pub payment_status: String,
    pub appointment_status: String,
}

/// One row of the administrative listing. Joined names are optional because
/// the listing tolerates dangling references.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct BookingOverview {
    pub id: i64,
    pub client_id: i64,
    pub service_id: i64,
    pub professional_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub reference_number: Option<String>,
    pub appointment_status: String,
    pub payment_status: String,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub client_birth_date: Option<NaiveDate>,
    pub service_name: Option<String>,
    pub professional_name: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Service {0} not found")]
    ServiceNotFound(i64),

    #[error("Service duration is invalid: {0} minutes")]
    InvalidDuration(i64),

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("The professional's schedule is blocked over the requested time")]
    ScheduleBlocked,

    #[error("The selected time is no longer available")]
    SlotUnavailable,

    #[error("Booking not found")]
    NotFound,

    #[error("Booking id is invalid")]
    InvalidId,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
