//! School records - profile completion, edits and ownership claims.

use crate::{
    entities::{School, school},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tracing::info;

/// Length of a UDISE school code.
pub const UDISE_LEN: usize = 11;

/// Checks that a school code is 11 ASCII digits.
pub fn validate_udise(udise: &str) -> Result<()> {
    if udise.len() != UDISE_LEN || !udise.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidInput {
            message: format!("School code must be {UDISE_LEN} digits, got '{udise}'"),
        });
    }
    Ok(())
}

/// Profile fields of a school. `None` leaves an existing value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchoolProfile {
    /// Display name
    pub name: String,
    /// Postal address
    pub address: String,
    /// Contact mobile number
    pub mobile: Option<String>,
    /// Contact email
    pub email: Option<String>,
}

/// Finds a school by its code.
pub async fn get_school<C>(db: &C, udise: &str) -> Result<school::Model>
where
    C: ConnectionTrait,
{
    School::find_by_id(udise.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "school",
            key: udise.to_string(),
        })
}

/// Creates a school or merges a profile edit into the existing record.
pub async fn upsert_school<C>(db: &C, udise: &str, profile: SchoolProfile) -> Result<school::Model>
where
    C: ConnectionTrait,
{
    validate_udise(udise)?;
    if profile.name.trim().is_empty() {
        return Err(Error::InvalidInput {
            message: "School name cannot be empty".to_string(),
        });
    }
    let now = Utc::now();

    let saved = if let Some(existing) = School::find_by_id(udise.to_string()).one(db).await? {
        let mobile = profile.mobile.or_else(|| existing.mobile.clone());
        let email = profile.email.or_else(|| existing.email.clone());
        let mut active: school::ActiveModel = existing.into();
        active.name = Set(profile.name.trim().to_string());
        active.address = Set(profile.address);
        active.mobile = Set(mobile);
        active.email = Set(email);
        active.updated_at = Set(now);
        active.update(db).await?
    } else {
        school::ActiveModel {
            udise: Set(udise.to_string()),
            name: Set(profile.name.trim().to_string()),
            address: Set(profile.address),
            mobile: Set(profile.mobile),
            email: Set(profile.email),
            owner_user_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?
    };

    info!("Saved school profile {}", saved.udise);
    Ok(saved)
}

/// Records `user_id` as the owning account of a school.
///
/// Claiming again with the same account is a no-op; a different account gets
/// `Error::SchoolAlreadyClaimed`.
pub async fn claim_school<C>(db: &C, udise: &str, user_id: &str) -> Result<school::Model>
where
    C: ConnectionTrait,
{
    let existing = get_school(db, udise).await?;
    match existing.owner_user_id.as_deref() {
        Some(owner) if owner == user_id => Ok(existing),
        Some(_) => Err(Error::SchoolAlreadyClaimed {
            udise: udise.to_string(),
        }),
        None => {
            let mut active: school::ActiveModel = existing.into();
            active.owner_user_id = Set(Some(user_id.to_string()));
            active.updated_at = Set(Utc::now());
            let claimed = active.update(db).await?;
            info!("School {udise} claimed by {user_id}");
            Ok(claimed)
        }
    }
}
