//! Shared test infrastructure.
//!
//! - Case / dated-entry builders for calendar tests (no database needed)
//! - `setup_test_db()` for the `#[ignore]`d Postgres tests; point `DATABASE_URL`
//!   at a disposable database before running them with `cargo test -- --ignored`.
#![allow(dead_code)]

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use lawdesk::auth::password;
use lawdesk::db::MIGRATOR;
use lawdesk::models::case::{Case, CaseStatus, CaseType, DateType, ImportantDate};
use lawdesk::models::user::{self, NewUser, Role};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const TEST_PASSWORD: &str = "secret123";
const DEFAULT_TEST_DATABASE_URL: &str = "postgres://localhost/lawdesk_test";

// ============================================================================
// FIXTURES
// ============================================================================

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .expect("valid RFC 3339 timestamp")
        .with_timezone(&Utc)
}

/// A wall-clock time in the server's local zone, as UTC.
pub fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Local
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .earliest()
        .expect("local time exists")
        .with_timezone(&Utc)
}

pub fn entry(id: i64, title: &str, date: DateTime<Utc>, date_type: DateType) -> ImportantDate {
    ImportantDate {
        id,
        title: title.to_string(),
        date,
        description: None,
        date_type,
    }
}

/// A case owned by `attorney_id` carrying `entries` in the given order.
pub fn case_with(id: i64, attorney_id: i64, entries: Vec<ImportantDate>) -> Case {
    let created = utc("2024-01-02T15:00:00Z");
    Case {
        id,
        case_number: format!("CASE-{id:06}"),
        client_name: format!("Client {id}"),
        client_email: format!("client{id}@example.com"),
        client_phone: "555-0100".to_string(),
        case_type: CaseType::CriminalDefense,
        description: "Test matter".to_string(),
        status: CaseStatus::Active,
        attorney_id,
        attorney_name: "Jane Smith".to_string(),
        case_manager_id: None,
        case_manager_name: None,
        billing_rate: 250.0,
        total_billed: 0.0,
        total_paid: 0.0,
        important_dates: entries,
        notes: Vec::new(),
        created_at: created,
        updated_at: created,
    }
}

// ============================================================================
// DATABASE SETUP
// ============================================================================

pub struct TestDb {
    pool: PgPool,
}

impl TestDb {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Connect to `DATABASE_URL`, apply migrations and empty every table.
pub async fn setup_test_db() -> TestDb {
    let url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| DEFAULT_TEST_DATABASE_URL.to_string());
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("Failed to connect to test database");

    MIGRATOR.run(&pool).await.expect("Failed to run migrations");
    sqlx::query("TRUNCATE case_notes, important_dates, cases, users RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to reset tables");

    TestDb { pool }
}

/// Insert a user with `TEST_PASSWORD` and return its id.
pub async fn create_user(pool: &PgPool, email: &str, role: Role) -> i64 {
    let hash = password::hash_password(TEST_PASSWORD).expect("hash");
    let new = NewUser {
        email: email.to_string(),
        password: hash,
        first_name: "Test".to_string(),
        last_name: email.split('@').next().unwrap_or("user").to_string(),
        role,
    };
    user::create(pool, &new).await.expect("create user")
}
