//! School entity - One row per school, keyed by its 11-character UDISE code.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// School database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schools")]
pub struct Model {
    /// UDISE code of the school
    #[sea_orm(primary_key, auto_increment = false)]
    pub udise: String,
    /// Display name shown on receipts and reports
    pub name: String,
    /// Postal address
    pub address: String,
    /// Contact mobile number
    pub mobile: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Auth-service id of the account that claimed this school
    pub owner_user_id: Option<String>,
    /// When the school record was created
    pub created_at: DateTimeUtc,
    /// When the profile was last edited
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between School and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One school has many admissions
    #[sea_orm(has_many = "super::admission::Entity")]
    Admissions,
}

impl Related<super::admission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Admissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
