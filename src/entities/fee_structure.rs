//! Fee structure entity - The fee heads a school charges in one academic session.
//!
//! Keyed by `{school_code}_{session}`, or `{school_code}_default` for the
//! fallback schedule. The heads are stored as a JSON document so schedules
//! saved under older shapes can still be read and migrated.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fee structure database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fee_structures")]
pub struct Model {
    /// Document key, see [`structure_key`]
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// UDISE code of the owning school
    pub school_code: String,
    /// `"YYYY-YYYY"` or `"default"`
    pub session: String,
    /// Ordered list of fee heads
    pub heads: Json,
    /// When an administrator last saved this schedule
    pub updated_at: DateTimeUtc,
}

/// Fee structures have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Builds the document key for a school and session.
#[must_use]
pub fn structure_key(school_code: &str, session: &str) -> String {
    format!("{school_code}_{session}")
}
