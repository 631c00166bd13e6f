use assert_matches::assert_matches;
use sqlx::SqlitePool;

use schedule_cell::models::{AvailabilityError, AvailableSlot};
use schedule_cell::services::{AvailabilityService, ScheduleRegistry};

// ==============================================================================
// TEST FIXTURES
// ==============================================================================

const DATE: &str = "2026-03-12";

async fn pool() -> SqlitePool {
    shared_database::connect_in_memory().await.unwrap()
}

async fn seed_professional(pool: &SqlitePool, name: &str) -> i64 {
    sqlx::query("INSERT INTO professionals (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

async fn seed_service(pool: &SqlitePool, name: &str, duration_minutes: i64) -> i64 {
    sqlx::query("INSERT INTO services (name, description, duration_minutes) VALUES (?, NULL, ?)")
        .bind(name)
        .bind(duration_minutes)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

async fn seed_range(
    pool: &SqlitePool,
    professional_id: i64,
    date: &str,
    start: &str,
    end: &str,
    status: &str,
) {
    sqlx::query(
        "INSERT INTO schedule_ranges (professional_id, date, start_time, end_time, status)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(professional_id)
    .bind(date)
    .bind(start)
    .bind(end)
    .bind(status)
    .execute(pool)
    .await
    .unwrap();
}

async fn seed_booking(
    pool: &SqlitePool,
    professional_id: i64,
    service_id: i64,
    date: &str,
    start: &str,
    end: Option<&str>,
) {
    let client_id = sqlx::query(
        "INSERT INTO clients (name, phone, birth_date) VALUES (?, ?, '1990-01-01')
         ON CONFLICT(phone) DO NOTHING",
    )
    .bind(format!("Client {}", start))
    .bind(format!("300-{}", start))
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid();

    sqlx::query(
        "INSERT INTO bookings (client_id, service_id, professional_id, date, start_time, end_time)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(client_id)
    .bind(service_id)
    .bind(professional_id)
    .bind(date)
    .bind(start)
    .bind(end)
    .execute(pool)
    .await
    .unwrap();
}

fn starts(slots: &[AvailableSlot]) -> Vec<&str> {
    slots.iter().map(|slot| slot.start_24.as_str()).collect()
}

// ==============================================================================
// SLOT GENERATION
// ==============================================================================

#[tokio::test]
async fn one_hour_window_yields_two_half_hour_slots() {
    let pool = pool().await;
    let professional = seed_professional(&pool, "Laura").await;
    let service = seed_service(&pool, "Consultation", 30).await;
    seed_range(&pool, professional, DATE, "09:00:00", "10:00:00", "active").await;

    let slots = AvailabilityService::new(pool)
        .get_available_slots(professional, DATE, service)
        .await
        .unwrap();

    assert_eq!(starts(&slots), vec!["09:00:00", "09:30:00"]);
    assert_eq!(slots[0].start, "9:00 AM");
    assert_eq!(slots[0].end, "9:30 AM");
    assert_eq!(slots[1].end, "10:00 AM");
}

#[tokio::test]
async fn inactive_range_blocks_every_colliding_candidate() {
    let pool = pool().await;
    let professional = seed_professional(&pool, "Laura").await;
    let service = seed_service(&pool, "Consultation", 30).await;
    seed_range(&pool, professional, DATE, "09:00:00", "10:00:00", "active").await;
    seed_range(&pool, professional, DATE, "09:15:00", "09:45:00", "inactive").await;

    let slots = AvailabilityService::new(pool)
        .get_available_slots(professional, DATE, service)
        .await
        .unwrap();

    // both candidates (09:00 and 09:30) intersect the exclusion
    assert!(slots.is_empty());
}

#[tokio::test]
async fn walk_continues_past_an_exclusion() {
    let pool = pool().await;
    let professional = seed_professional(&pool, "Laura").await;
    let service = seed_service(&pool, "Consultation", 30).await;
    seed_range(&pool, professional, DATE, "09:00:00", "11:00:00", "active").await;
    seed_range(&pool, professional, DATE, "09:15:00", "09:45:00", "inactive").await;

    let slots = AvailabilityService::new(pool)
        .get_available_slots(professional, DATE, service)
        .await
        .unwrap();

    // the cursor advances one full step per skip, never resizing around the gap
    assert_eq!(starts(&slots), vec!["10:00:00", "10:30:00"]);
}

#[tokio::test]
async fn existing_booking_hides_its_slot() {
    let pool = pool().await;
    let professional = seed_professional(&pool, "Laura").await;
    let service = seed_service(&pool, "Consultation", 30).await;
    seed_range(&pool, professional, DATE, "09:00:00", "10:00:00", "active").await;
    seed_booking(
        &pool,
        professional,
        service,
        DATE,
        "09:00:00",
        Some("09:30:00"),
    )
    .await;

    let slots = AvailabilityService::new(pool)
        .get_available_slots(professional, DATE, service)
        .await
        .unwrap();

    assert_eq!(starts(&slots), vec!["09:30:00"]);
}

#[tokio::test]
async fn bookings_without_end_time_are_ignored() {
    let pool = pool().await;
    let professional = seed_professional(&pool, "Laura").await;
    let service = seed_service(&pool, "Consultation", 30).await;
    seed_range(&pool, professional, DATE, "09:00:00", "10:00:00", "active").await;
    seed_booking(&pool, professional, service, DATE, "09:00:00", None).await;

    let slots = AvailabilityService::new(pool)
        .get_available_slots(professional, DATE, service)
        .await
        .unwrap();

    assert_eq!(starts(&slots), vec!["09:00:00", "09:30:00"]);
}

#[tokio::test]
async fn no_active_ranges_means_no_slots() {
    let pool = pool().await;
    let professional = seed_professional(&pool, "Laura").await;
    let service = seed_service(&pool, "Consultation", 30).await;

    let slots = AvailabilityService::new(pool)
        .get_available_slots(professional, DATE, service)
        .await
        .unwrap();

    assert!(slots.is_empty());
}

#[tokio::test]
async fn skips_later_active_ranges() {
    let pool = pool().await;
    let professional = seed_professional(&pool, "Laura").await;
    let service = seed_service(&pool, "Consultation", 60).await;
    seed_range(&pool, professional, DATE, "14:00:00", "16:00:00", "active").await;
    seed_range(&pool, professional, DATE, "09:00:00", "10:00:00", "active").await;

    let slots = AvailabilityService::new(pool)
        .get_available_slots(professional, DATE, service)
        .await
        .unwrap();

    // only the earliest-starting window is honored
    assert_eq!(starts(&slots), vec!["09:00:00"]);
}

#[tokio::test]
async fn trailing_partial_slot_is_dropped() {
    let pool = pool().await;
    let professional = seed_professional(&pool, "Laura").await;
    let service = seed_service(&pool, "Long session", 45).await;
    seed_range(&pool, professional, DATE, "09:00:00", "10:00:00", "active").await;

    let slots = AvailabilityService::new(pool)
        .get_available_slots(professional, DATE, service)
        .await
        .unwrap();

    assert_eq!(starts(&slots), vec!["09:00:00"]);
}

// ==============================================================================
// INPUT VALIDATION
// ==============================================================================

#[tokio::test]
async fn rejects_malformed_date() {
    let pool = pool().await;
    let professional = seed_professional(&pool, "Laura").await;
    let service = seed_service(&pool, "Consultation", 30).await;

    let error = AvailabilityService::new(pool)
        .get_available_slots(professional, "12-03-2026", service)
        .await
        .unwrap_err();

    assert_matches!(error, AvailabilityError::InvalidDateFormat(_));
}

#[tokio::test]
async fn rejects_unknown_service() {
    let pool = pool().await;
    let professional = seed_professional(&pool, "Laura").await;

    let error = AvailabilityService::new(pool)
        .get_available_slots(professional, DATE, 999)
        .await
        .unwrap_err();

    assert_matches!(error, AvailabilityError::ServiceNotFound(999));
}

#[tokio::test]
async fn rejects_non_positive_duration() {
    let pool = pool().await;
    let professional = seed_professional(&pool, "Laura").await;
    let service = seed_service(&pool, "Broken", 0).await;
    seed_range(&pool, professional, DATE, "09:00:00", "10:00:00", "active").await;

    let error = AvailabilityService::new(pool)
        .get_available_slots(professional, DATE, service)
        .await
        .unwrap_err();

    assert_matches!(error, AvailabilityError::InvalidDuration(0));
}

#[tokio::test]
async fn rejects_corrupt_working_window() {
    let pool = pool().await;
    let professional = seed_professional(&pool, "Laura").await;
    let service = seed_service(&pool, "Consultation", 30).await;
    seed_range(&pool, professional, DATE, "10:00:00", "09:00:00", "active").await;

    let error = AvailabilityService::new(pool)
        .get_available_slots(professional, DATE, service)
        .await
        .unwrap_err();

    assert_matches!(error, AvailabilityError::InvalidRange);
}

// ==============================================================================
// SCHEDULE REGISTRY
// ==============================================================================

#[tokio::test]
async fn registry_orders_ranges_and_separates_statuses() {
    let pool = pool().await;
    let professional = seed_professional(&pool, "Laura").await;
    seed_range(&pool, professional, DATE, "14:00:00", "16:00:00", "active").await;
    seed_range(&pool, professional, DATE, "09:00:00", "12:00:00", "active").await;
    seed_range(&pool, professional, DATE, "10:00:00", "10:30:00", "inactive").await;

    let registry = ScheduleRegistry::new(pool);
    let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 12).unwrap();

    let active = registry.active_ranges(professional, date).await.unwrap();
    assert_eq!(active.len(), 2);
    assert!(active[0].start_time < active[1].start_time);

    let inactive = registry.inactive_ranges(professional, date).await.unwrap();
    assert_eq!(inactive.len(), 1);
}

#[tokio::test]
async fn registry_keeps_overlapping_rows_unmerged() {
    let pool = pool().await;
    let professional = seed_professional(&pool, "Laura").await;
    seed_range(&pool, professional, DATE, "09:00:00", "11:00:00", "inactive").await;
    seed_range(&pool, professional, DATE, "10:00:00", "12:00:00", "inactive").await;

    let registry = ScheduleRegistry::new(pool);
    let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 12).unwrap();

    let inactive = registry.inactive_ranges(professional, date).await.unwrap();
    assert_eq!(inactive.len(), 2);
}
