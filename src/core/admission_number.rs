//! Admission number generation.
//!
//! Numbers have the form `ADM/{yy}/{serial:04}`, one sequence per school and
//! calendar year of admission. Auto numbering draws serials from the
//! `admission_counters` row for that school and year. The row is seeded from
//! the number of approved admissions on first use and then only ever bumped
//! with `last_serial = last_serial + 1`, so two approvals racing for the same
//! school never read the same serial. A serial whose number is already taken
//! (a manual entry, for instance) is skipped, and the counter is first raised
//! to the approved count so a run of manual numbers is skipped in one step.

use crate::{
    core::session::year_suffix,
    entities::{
        Admission, AdmissionCounter, AdmissionStatus, admission, admission_counter,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{
    Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use tracing::{debug, warn};

/// Formats the canonical admission number for a year and serial.
#[must_use]
pub fn format_admission_number(year: i32, serial: i64) -> String {
    format!("ADM/{}/{serial:04}", year_suffix(year))
}

/// First and last day of a calendar year.
pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1);
    let last = NaiveDate::from_ymd_opt(year, 12, 31);
    first.zip(last).ok_or_else(|| Error::InvalidInput {
        message: format!("{year} is not a valid admission year"),
    })
}

/// Counts approved admissions for a school whose admission date falls in `year`.
pub async fn count_approved_in_year<C>(db: &C, school_code: &str, year: i32) -> Result<u64>
where
    C: ConnectionTrait,
{
    let (first, last) = year_bounds(year)?;
    Admission::find()
        .filter(admission::Column::SchoolCode.eq(school_code))
        .filter(admission::Column::Status.eq(AdmissionStatus::Approved))
        .filter(admission::Column::AdmissionDate.between(first, last))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Whether any admission of the school already carries `admission_number`.
///
/// `exclude_id` leaves one record out of the check, for re-saving a record
/// under its own number.
pub async fn admission_number_exists<C>(
    db: &C,
    school_code: &str,
    admission_number: &str,
    exclude_id: Option<i64>,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let mut query = Admission::find()
        .filter(admission::Column::SchoolCode.eq(school_code))
        .filter(admission::Column::AdmissionNumber.eq(admission_number));
    if let Some(id) = exclude_id {
        query = query.filter(admission::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

/// Bumps the school's counter for `year` and returns the new serial.
///
/// Seeds the counter from the approved count the first time it is used. The
/// seed insert does nothing if another caller created the row first.
async fn next_serial<C>(db: &C, school_code: &str, year: i32) -> Result<i64>
where
    C: ConnectionTrait,
{
    let key = admission_counter::counter_key(school_code, year);

    if AdmissionCounter::find_by_id(key.clone()).one(db).await?.is_none() {
        let approved = count_approved_in_year(db, school_code, year).await?;
        let seed = i64::try_from(approved).map_err(|e| Error::Database {
            message: format!("approved count out of range: {e}"),
        })?;
        debug!("Seeding admission counter {key} at {seed}");
        AdmissionCounter::insert(admission_counter::ActiveModel {
            id: Set(key.clone()),
            school_code: Set(school_code.to_string()),
            year: Set(year),
            last_serial: Set(seed),
        })
        .on_conflict(
            OnConflict::column(admission_counter::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    }

    AdmissionCounter::update_many()
        .col_expr(
            admission_counter::Column::LastSerial,
            Expr::col(admission_counter::Column::LastSerial).add(1),
        )
        .filter(admission_counter::Column::Id.eq(key.as_str()))
        .exec(db)
        .await?;

    AdmissionCounter::find_by_id(key.clone())
        .one(db)
        .await?
        .map(|counter| counter.last_serial)
        .ok_or_else(|| Error::Database {
            message: format!("admission counter {key} vanished during update"),
        })
}

/// Raises the counter for `year` to at least `floor`. Never lowers it.
async fn raise_counter_to<C>(db: &C, school_code: &str, year: i32, floor: u64) -> Result<()>
where
    C: ConnectionTrait,
{
    let key = admission_counter::counter_key(school_code, year);
    let floor = i64::try_from(floor).map_err(|e| Error::Database {
        message: format!("approved count out of range: {e}"),
    })?;
    AdmissionCounter::update_many()
        .col_expr(admission_counter::Column::LastSerial, Expr::value(floor))
        .filter(admission_counter::Column::Id.eq(key.as_str()))
        .filter(admission_counter::Column::LastSerial.lt(floor))
        .exec(db)
        .await?;
    Ok(())
}

/// Produces an admission number for a school and year.
///
/// With `manual_number` the number is stored as typed, except that surrounding
/// whitespace is stripped. It fails with `Error::DuplicateAdmissionNumber` if
/// another admission of the school already uses it. Without it the next
/// serial is drawn from the counter inside a transaction. Auto numbering only
/// ends once it finds a free number: every skip moves the serial forward and a
/// school holds finitely many numbers.
pub async fn generate_admission_number<C>(
    db: &C,
    school_code: &str,
    year: i32,
    manual_number: Option<&str>,
) -> Result<String>
where
    C: ConnectionTrait + TransactionTrait,
{
    if let Some(manual) = manual_number {
        let manual = manual.trim();
        if manual.is_empty() {
            return Err(Error::InvalidInput {
                message: "Admission number cannot be empty".to_string(),
            });
        }
        if admission_number_exists(db, school_code, manual, None).await? {
            return Err(Error::DuplicateAdmissionNumber {
                admission_number: manual.to_string(),
            });
        }
        return Ok(manual.to_string());
    }

    year_bounds(year)?;
    let txn = db.begin().await?;

    loop {
        let serial = next_serial(&txn, school_code, year).await?;
        let candidate = format_admission_number(year, serial);
        if !admission_number_exists(&txn, school_code, &candidate, None).await? {
            txn.commit().await?;
            debug!("Generated admission number {candidate} for school {school_code}");
            return Ok(candidate);
        }
        warn!("Admission number {candidate} already taken in school {school_code}, skipping");
        let approved = count_approved_in_year(&txn, school_code, year).await?;
        raise_counter_to(&txn, school_code, year, approved).await?;
    }
}
