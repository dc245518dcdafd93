//! Admission entity - One row per admission form.
//!
//! Fields the core filters or computes on (school, number, date, class, caste,
//! status) are typed columns. The remaining form groups (contact, address, bank,
//! previous school, subject selection) are kept together in the `details`
//! document, as submitted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Approval state of an admission. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AdmissionStatus {
    /// Submitted, awaiting review
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Accepted; carries an admission date and number
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Turned down
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl AdmissionStatus {
    /// Whether no further transition is allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Stored name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Admission database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admissions")]
pub struct Model {
    /// Store-generated identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// UDISE code of the owning school
    #[sea_orm(indexed)]
    pub school_code: String,
    /// Admission number, assigned when the admission is approved
    pub admission_number: Option<String>,
    /// Class roll number
    pub roll_number: Option<String>,
    /// Date of admission; required for approval
    pub admission_date: Option<Date>,
    /// Class applied for ("9" through "12")
    pub class_name: String,
    /// Stream for classes 11 and 12 ("Arts", "Commerce", "Science")
    pub stream: Option<String>,
    /// Approval state
    pub status: AdmissionStatus,
    /// When the form was submitted
    pub submitted_at: DateTimeUtc,
    /// Student name in English
    pub student_name: String,
    /// Student name in Hindi
    pub student_name_hi: Option<String>,
    /// Date of birth
    pub date_of_birth: Option<Date>,
    /// Gender as entered on the form
    pub gender: String,
    /// Caste category ("general", "obc", "sc", "st", ...)
    pub caste: String,
    /// Religion
    pub religion: Option<String>,
    /// Nationality
    pub nationality: String,
    /// Whether the student declared a disability
    pub is_disabled: bool,
    /// Contact, address, bank, previous-school and subject groups
    pub details: Json,
}

/// Defines relationships between Admission and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each admission belongs to one school
    #[sea_orm(
        belongs_to = "super::school::Entity",
        from = "Column::SchoolCode",
        to = "super::school::Column::Udise"
    )]
    School,
}

impl Related<super::school::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::School.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
