//! Admission counter entity - Last serial issued per school and admission year.
//!
//! Incremented in place with `last_serial = last_serial + 1` so concurrent
//! approvals never observe the same value.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Admission counter database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admission_counters")]
pub struct Model {
    /// `{school_code}_{year}`, see [`counter_key`]
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// UDISE code of the owning school
    pub school_code: String,
    /// Calendar year of admission
    pub year: i32,
    /// Highest serial handed out so far
    pub last_serial: i64,
}

/// `AdmissionCounter` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Builds the counter key for a school and year.
#[must_use]
pub fn counter_key(school_code: &str, year: i32) -> String {
    format!("{school_code}_{year}")
}
