//! Admission business logic - submission, approval workflow and lookups.
//!
//! Forms are submitted as `pending` and leave that state exactly once, either
//! to `approved` (which requires an admission date and assigns the admission
//! number) or to `rejected`. The quick-entry path writes an already approved
//! record in one step.

use crate::{
    core::{
        admission_number::generate_admission_number,
        fee_calculator::{ClassBucket, FeeBreakdown, calculate_fees_for_bucket},
        fee_structure::resolve_fee_structure,
        school::{get_school, validate_udise},
        session::session_for_date,
    },
    entities::{Admission, AdmissionStatus, admission},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Form data for a new admission.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAdmission {
    /// UDISE code of the school applied to
    pub school_code: String,
    /// Class applied for
    pub class_name: String,
    /// Stream for classes 11 and 12
    pub stream: Option<String>,
    /// Class roll number, if already known
    pub roll_number: Option<String>,
    /// Student name in English
    pub student_name: String,
    /// Student name in Hindi
    pub student_name_hi: Option<String>,
    /// Date of birth
    pub date_of_birth: Option<NaiveDate>,
    /// Gender
    pub gender: String,
    /// Caste category
    pub caste: String,
    /// Religion
    pub religion: Option<String>,
    /// Nationality
    pub nationality: String,
    /// Disability declared
    pub is_disabled: bool,
    /// Contact, address, bank, previous-school and subject groups
    pub details: serde_json::Value,
}

impl NewAdmission {
    fn validate(&self) -> Result<()> {
        validate_udise(&self.school_code)?;
        if self.student_name.trim().is_empty() {
            return Err(Error::InvalidInput {
                message: "Student name cannot be empty".to_string(),
            });
        }
        if self.class_name.trim().is_empty() {
            return Err(Error::InvalidInput {
                message: "Class cannot be empty".to_string(),
            });
        }
        if ClassBucket::parse_class_label(&self.class_name).is_none() {
            return Err(Error::InvalidInput {
                message: format!("Unknown class '{}', expected 9 to 12", self.class_name.trim()),
            });
        }
        Ok(())
    }

    fn into_active_model(self) -> admission::ActiveModel {
        admission::ActiveModel {
            school_code: Set(self.school_code),
            admission_number: Set(None),
            roll_number: Set(self.roll_number),
            admission_date: Set(None),
            class_name: Set(self.class_name.trim().to_string()),
            stream: Set(self.stream),
            status: Set(AdmissionStatus::Pending),
            submitted_at: Set(Utc::now()),
            student_name: Set(self.student_name.trim().to_string()),
            student_name_hi: Set(self.student_name_hi),
            date_of_birth: Set(self.date_of_birth),
            gender: Set(self.gender),
            caste: Set(self.caste.trim().to_lowercase()),
            religion: Set(self.religion),
            nationality: Set(self.nationality),
            is_disabled: Set(self.is_disabled),
            details: Set(self.details),
            ..Default::default()
        }
    }
}

/// Stores a submitted form as a pending admission.
pub async fn submit_admission<C>(db: &C, new: NewAdmission) -> Result<admission::Model>
where
    C: ConnectionTrait,
{
    new.validate()?;
    get_school(db, &new.school_code).await?;

    let saved = new.into_active_model().insert(db).await?;
    info!(
        "Admission {} submitted for school {}",
        saved.id, saved.school_code
    );
    Ok(saved)
}

/// Stores an admission that is approved on entry, assigning its number.
///
/// The number and the record are written in one transaction, so a failed
/// insert does not burn a serial.
pub async fn quick_entry_admission<C>(
    db: &C,
    new: NewAdmission,
    admission_date: NaiveDate,
    manual_number: Option<&str>,
) -> Result<admission::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    new.validate()?;
    let txn = db.begin().await?;
    get_school(&txn, &new.school_code).await?;

    let number = generate_admission_number(
        &txn,
        &new.school_code,
        admission_date.year(),
        manual_number,
    )
    .await?;

    let mut active = new.into_active_model();
    active.status = Set(AdmissionStatus::Approved);
    active.admission_date = Set(Some(admission_date));
    active.admission_number = Set(Some(number));
    let saved = active.insert(&txn).await?;
    txn.commit().await?;

    info!(
        "Admission {} entered as approved with number {:?}",
        saved.id, saved.admission_number
    );
    Ok(saved)
}

/// Finds an admission by id.
pub async fn get_admission<C>(db: &C, id: i64) -> Result<admission::Model>
where
    C: ConnectionTrait,
{
    Admission::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "admission",
            key: id.to_string(),
        })
}

/// Lists a school's admissions in submission order, optionally by status.
pub async fn list_admissions<C>(
    db: &C,
    school_code: &str,
    status: Option<AdmissionStatus>,
) -> Result<Vec<admission::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Admission::find().filter(admission::Column::SchoolCode.eq(school_code));
    if let Some(status) = status {
        query = query.filter(admission::Column::Status.eq(status));
    }
    query
        .order_by_asc(admission::Column::SubmittedAt)
        .order_by_asc(admission::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

fn ensure_pending(record: &admission::Model, to: AdmissionStatus) -> Result<()> {
    if record.status.is_terminal() {
        return Err(Error::InvalidStatusTransition {
            from: record.status.as_str().to_string(),
            to: to.as_str().to_string(),
        });
    }
    Ok(())
}

/// Approves a pending admission.
///
/// Uses `admission_date` if given, otherwise the date already on the record;
/// approval without any date fails. The admission number is generated for the
/// year of that date, or taken from `manual_number` after a duplicate check.
pub async fn approve_admission<C>(
    db: &C,
    id: i64,
    admission_date: Option<NaiveDate>,
    manual_number: Option<&str>,
) -> Result<admission::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let record = get_admission(&txn, id).await?;
    ensure_pending(&record, AdmissionStatus::Approved)?;

    let date = admission_date
        .or(record.admission_date)
        .ok_or_else(|| Error::InvalidInput {
            message: "An admission date is required to approve an admission".to_string(),
        })?;

    let number =
        generate_admission_number(&txn, &record.school_code, date.year(), manual_number).await?;

    let mut active: admission::ActiveModel = record.into();
    active.status = Set(AdmissionStatus::Approved);
    active.admission_date = Set(Some(date));
    active.admission_number = Set(Some(number));
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    info!(
        "Admission {} approved with number {:?}",
        updated.id, updated.admission_number
    );
    Ok(updated)
}

/// Rejects a pending admission.
pub async fn reject_admission<C>(db: &C, id: i64) -> Result<admission::Model>
where
    C: ConnectionTrait,
{
    let record = get_admission(db, id).await?;
    ensure_pending(&record, AdmissionStatus::Rejected)?;

    let mut active: admission::ActiveModel = record.into();
    active.status = Set(AdmissionStatus::Rejected);
    let updated = active.update(db).await?;
    info!("Admission {} rejected", updated.id);
    Ok(updated)
}

/// Fee breakdown for a stored admission.
///
/// `session` defaults to the session of the admission date, or of today for
/// admissions without one.
pub async fn fee_breakdown_for_admission<C>(
    db: &C,
    id: i64,
    session: Option<&str>,
) -> Result<FeeBreakdown>
where
    C: ConnectionTrait,
{
    let record = get_admission(db, id).await?;
    let session = session.map_or_else(
        || session_for_date(record.admission_date.unwrap_or_else(|| Utc::now().date_naive())),
        str::to_string,
    );
    let heads = resolve_fee_structure(db, &record.school_code, &session).await;
    let bucket = ClassBucket::for_admission(&record.class_name, record.stream.as_deref());
    Ok(calculate_fees_for_bucket(bucket, &record.caste, &heads))
}
