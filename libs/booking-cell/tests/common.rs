#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use sqlx::SqlitePool;

use booking_cell::models::CreateBookingRequest;

pub const DATE: &str = "2026-03-12";

pub async fn pool() -> SqlitePool {
    shared_database::connect_in_memory().await.unwrap()
}

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

pub fn time(value: &str) -> NaiveTime {
    NaiveTime::parse_from_str(value, "%H:%M:%S").unwrap()
}

pub async fn seed_professional(pool: &SqlitePool, name: &str) -> i64 {
    sqlx::query("INSERT INTO professionals (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn seed_service(
    pool: &SqlitePool,
    name: &str,
    description: Option<&str>,
    duration_minutes: i64,
) -> i64 {
    sqlx::query("INSERT INTO services (name, description, duration_minutes) VALUES (?, ?, ?)")
        .bind(name)
        .bind(description)
        .bind(duration_minutes)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn seed_client(pool: &SqlitePool, name: &str, phone: &str, birth_date: &str) -> i64 {
    sqlx::query("INSERT INTO clients (name, phone, birth_date) VALUES (?, ?, ?)")
        .bind(name)
        .bind(phone)
        .bind(birth_date)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn seed_range(
    pool: &SqlitePool,
    professional_id: i64,
    day: &str,
    start: &str,
    end: &str,
    status: &str,
) {
    sqlx::query(
        "INSERT INTO schedule_ranges (professional_id, date, start_time, end_time, status)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(professional_id)
    .bind(day)
    .bind(start)
    .bind(end)
    .bind(status)
    .execute(pool)
    .await
    .unwrap();
}

pub fn request(professional_id: i64, service_id: i64, day: &str, start: &str) -> CreateBookingRequest {
    CreateBookingRequest {
        client_name: Some("Ana Torres".to_string()),
        client_phone: Some("3001112233".to_string()),
        client_birth_date: Some(date("1990-04-12")),
        professional_id: Some(professional_id),
        service_id: Some(service_id),
        date: Some(date(day)),
        start_time: Some(time(start)),
        reference_number: None,
    }
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}
