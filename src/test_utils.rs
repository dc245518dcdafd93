//! Shared test utilities.
//!
//! Helpers for setting up in-memory databases and creating schools and
//! admissions with sensible defaults.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use crate::{
    core::{
        admission::NewAdmission,
        school::{SchoolProfile, upsert_school},
    },
    entities::{Admission, AdmissionStatus, admission, school},
    errors::Result,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// School code used by most tests.
pub const TEST_SCHOOL: &str = "10230405060";

/// A second school, for isolation checks.
pub const OTHER_SCHOOL: &str = "20230405060";

/// Routes tracing output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a school with placeholder profile data.
pub async fn create_test_school(db: &DatabaseConnection, udise: &str) -> Result<school::Model> {
    upsert_school(
        db,
        udise,
        SchoolProfile {
            name: format!("Test School {udise}"),
            address: "Test Address".to_string(),
            mobile: None,
            email: None,
        },
    )
    .await
}

/// In-memory database with [`TEST_SCHOOL`] already created.
pub async fn setup_school_db() -> Result<DatabaseConnection> {
    let db = setup_test_db().await?;
    create_test_school(&db, TEST_SCHOOL).await?;
    Ok(db)
}

/// Shorthand for a calendar date.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// A class 9 general-category form for `school_code`.
pub fn test_new_admission(school_code: &str, student_name: &str) -> NewAdmission {
    NewAdmission {
        school_code: school_code.to_string(),
        class_name: "9".to_string(),
        stream: None,
        roll_number: None,
        student_name: student_name.to_string(),
        student_name_hi: None,
        date_of_birth: Some(date(2010, 5, 17)),
        gender: "female".to_string(),
        caste: "general".to_string(),
        religion: Some("hindu".to_string()),
        nationality: "indian".to_string(),
        is_disabled: false,
        details: json!({
            "contact": {"mobile": "9000000000"},
            "address": {"village": "Rampur", "district": "Patna"},
        }),
    }
}

fn admission_active_model(
    school_code: &str,
    status: AdmissionStatus,
    admission_date: Option<NaiveDate>,
    admission_number: Option<&str>,
) -> admission::ActiveModel {
    admission::ActiveModel {
        school_code: Set(school_code.to_string()),
        admission_number: Set(admission_number.map(str::to_string)),
        roll_number: Set(None),
        admission_date: Set(admission_date),
        class_name: Set("9".to_string()),
        stream: Set(None),
        status: Set(status),
        submitted_at: Set(Utc::now()),
        student_name: Set("Test Student".to_string()),
        student_name_hi: Set(None),
        date_of_birth: Set(None),
        gender: Set("male".to_string()),
        caste: Set("general".to_string()),
        religion: Set(None),
        nationality: Set("indian".to_string()),
        is_disabled: Set(false),
        details: Set(json!({})),
        ..Default::default()
    }
}

/// Writes an approved admission directly, bypassing numbering.
pub async fn insert_approved_admission(
    db: &DatabaseConnection,
    school_code: &str,
    admission_date: NaiveDate,
    admission_number: &str,
) -> Result<admission::Model> {
    Ok(admission_active_model(
        school_code,
        AdmissionStatus::Approved,
        Some(admission_date),
        Some(admission_number),
    )
    .insert(db)
    .await?)
}

/// Writes a pending admission directly.
pub async fn insert_pending_admission(
    db: &DatabaseConnection,
    school_code: &str,
) -> Result<admission::Model> {
    Ok(admission_active_model(school_code, AdmissionStatus::Pending, None, None)
        .insert(db)
        .await?)
}

/// Writes `count` approved admissions in bulk.
pub async fn insert_many_approved(
    db: &DatabaseConnection,
    school_code: &str,
    count: usize,
) -> Result<()> {
    let rows: Vec<admission::ActiveModel> = (0..count)
        .map(|i| {
            admission_active_model(
                school_code,
                AdmissionStatus::Approved,
                Some(date(2024, 4, 1)),
                Some(&format!("BULK-{i}")),
            )
        })
        .collect();
    for chunk in rows.chunks(200) {
        Admission::insert_many(chunk.to_vec()).exec(db).await?;
    }
    Ok(())
}

/// An admission model for `MockDatabase` query results.
pub fn mock_admission(id: i64, school_code: &str) -> admission::Model {
    admission::Model {
        id,
        school_code: school_code.to_string(),
        admission_number: Some(format!("ADM/24/{id:04}")),
        roll_number: None,
        admission_date: Some(date(2024, 4, 1)),
        class_name: "9".to_string(),
        stream: None,
        status: AdmissionStatus::Approved,
        submitted_at: Utc::now(),
        student_name: "Mock Student".to_string(),
        student_name_hi: None,
        date_of_birth: None,
        gender: "male".to_string(),
        caste: "general".to_string(),
        religion: None,
        nationality: "indian".to_string(),
        is_disabled: false,
        details: json!({}),
    }
}
