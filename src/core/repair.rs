//! Duplicate admission number repair.
//!
//! Re-derives every approved admission's number from scratch: records are
//! grouped by calendar year of admission, ordered by admission date within the
//! year (store order breaks ties), and numbered `ADM/{yy}/0001` onwards. Only
//! records whose number changes are written, in batches no larger than the
//! store accepts, so running the repair twice changes nothing the second time.
//! Each year's counter is then set to the size of its group so auto numbering
//! continues after the last repaired serial.

use crate::{
    config::app::validate_batch_limit,
    core::admission_number::format_admission_number,
    entities::{
        Admission, AdmissionCounter, AdmissionStatus, admission, admission_counter,
    },
    errors::Result,
};
use chrono::Datelike;
use sea_orm::{
    QueryOrder, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// Outcome of a repair run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Records whose admission number was changed
    pub updated_count: u64,
    /// Size of each committed batch, in commit order
    pub batches: Vec<usize>,
}

/// A number change the repair will write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberChange {
    /// Admission id
    pub id: i64,
    /// Number before the repair
    pub old_number: Option<String>,
    /// Canonical number
    pub new_number: String,
}

/// Works out canonical numbers for a school's approved admissions.
///
/// `records` must be in store order. Returns the changes needed and the
/// number of records per admission year. Records without an admission date
/// are left alone.
#[must_use]
pub fn plan_renumbering(records: Vec<admission::Model>) -> (Vec<NumberChange>, BTreeMap<i32, i64>) {
    let mut by_year: BTreeMap<i32, Vec<admission::Model>> = BTreeMap::new();
    for record in records {
        match record.admission_date {
            Some(date) => by_year.entry(date.year()).or_default().push(record),
            None => warn!("Approved admission {} has no admission date, skipping", record.id),
        }
    }

    let mut changes = Vec::new();
    let mut year_sizes = BTreeMap::new();
    for (year, mut group) in by_year {
        // stable: equal dates keep store order
        group.sort_by_key(|r| r.admission_date);
        for (serial, record) in (1_i64..).zip(&group) {
            let canonical = format_admission_number(year, serial);
            if record.admission_number.as_deref() != Some(canonical.as_str()) {
                changes.push(NumberChange {
                    id: record.id,
                    old_number: record.admission_number.clone(),
                    new_number: canonical,
                });
            }
        }
        year_sizes.insert(year, i64::try_from(group.len()).unwrap_or(i64::MAX));
    }
    (changes, year_sizes)
}

/// Renumbers a school's approved admissions canonically.
///
/// Changes are committed in batches of at most `batch_limit`; each batch is
/// atomic on its own.
#[instrument(skip(db))]
pub async fn repair_duplicate_admission_numbers<C>(
    db: &C,
    school_code: &str,
    batch_limit: usize,
) -> Result<RepairReport>
where
    C: ConnectionTrait + TransactionTrait,
{
    validate_batch_limit(batch_limit)?;

    let records = Admission::find()
        .filter(admission::Column::SchoolCode.eq(school_code))
        .filter(admission::Column::Status.eq(AdmissionStatus::Approved))
        .order_by_asc(admission::Column::Id)
        .all(db)
        .await?;
    let (changes, year_sizes) = plan_renumbering(records);

    let mut report = RepairReport::default();
    for chunk in changes.chunks(batch_limit) {
        let txn = db.begin().await?;
        for change in chunk {
            Admission::update_many()
                .col_expr(
                    admission::Column::AdmissionNumber,
                    Expr::value(change.new_number.clone()),
                )
                .filter(admission::Column::Id.eq(change.id))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;
        report.updated_count += chunk.len() as u64;
        report.batches.push(chunk.len());
        info!(
            "Committed admission number batch of {} for school {school_code}",
            chunk.len()
        );
    }

    if !year_sizes.is_empty() {
        let txn = db.begin().await?;
        for (year, size) in &year_sizes {
            AdmissionCounter::insert(admission_counter::ActiveModel {
                id: Set(admission_counter::counter_key(school_code, *year)),
                school_code: Set(school_code.to_string()),
                year: Set(*year),
                last_serial: Set(*size),
            })
            .on_conflict(
                OnConflict::column(admission_counter::Column::Id)
                    .update_column(admission_counter::Column::LastSerial)
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        }
        txn.commit().await?;
    }

    info!(
        "Repaired {} admission numbers for school {school_code}",
        report.updated_count
    );
    Ok(report)
}
