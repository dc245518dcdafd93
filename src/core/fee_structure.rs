//! Fee structure resolution and migration.
//!
//! Every school may save one fee schedule per academic session plus a `default`
//! schedule. Lookups fall back session -> default -> the built-in table, and any
//! stored schedule is migrated onto the canonical head list before use: amounts
//! are kept, names and fund tags always come from the canonical table, missing
//! heads are filled in with their default amounts, and the result follows
//! canonical order.
//!
//! Store failures during resolution never reach the caller. Printing a receipt
//! with default fees is preferable to not printing it at all.

use crate::{
    core::{fee_calculator::ClassBucket, session},
    entities::{FeeStructure, fee_structure},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Which fund a fee head is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundType {
    /// Student Fund
    StudentFund,
    /// Development Fund
    DevelopmentFund,
}

/// Per-class amounts of a fee head, in whole rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassAmounts {
    /// Class 9
    pub class9: u32,
    /// Class 10
    pub class10: u32,
    /// Class 11, arts or commerce
    pub class11ac: u32,
    /// Class 11, science
    pub class11s: u32,
    /// Class 12, arts or commerce
    pub class12ac: u32,
    /// Class 12, science
    pub class12s: u32,
}

impl ClassAmounts {
    const fn from_array(a: [u32; 6]) -> Self {
        Self {
            class9: a[0],
            class10: a[1],
            class11ac: a[2],
            class11s: a[3],
            class12ac: a[4],
            class12s: a[5],
        }
    }

    /// Amount charged for a class bucket.
    #[must_use]
    pub const fn get(&self, bucket: ClassBucket) -> u32 {
        match bucket {
            ClassBucket::Class9 => self.class9,
            ClassBucket::Class10 => self.class10,
            ClassBucket::Class11ArtsCommerce => self.class11ac,
            ClassBucket::Class11Science => self.class11s,
            ClassBucket::Class12ArtsCommerce => self.class12ac,
            ClassBucket::Class12Science => self.class12s,
        }
    }
}

/// A single fee line item with its per-class amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeHead {
    /// Stable id, shared across sessions
    pub id: u32,
    /// English name
    pub name: String,
    /// Hindi name
    pub name_hi: String,
    /// Fund this head is reported under
    pub fund: FundType,
    /// Per-class amounts
    pub amounts: ClassAmounts,
}

/// Amounts as found in a stored schedule.
///
/// Covers both the six-bucket shape and the older two-bucket shape that only
/// recorded `class9` and `class11`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct StoredAmounts {
    /// Class 9
    pub class9: Option<u32>,
    /// Class 10
    pub class10: Option<u32>,
    /// Two-bucket shape: every class 11 and 12 stream
    pub class11: Option<u32>,
    /// Class 11, arts or commerce
    pub class11ac: Option<u32>,
    /// Class 11, science
    pub class11s: Option<u32>,
    /// Class 12, arts or commerce
    pub class12ac: Option<u32>,
    /// Class 12, science
    pub class12s: Option<u32>,
}

impl StoredAmounts {
    /// Maps whatever buckets were stored onto the six-bucket shape.
    ///
    /// Class 10 reads class 9 and every class 11/12 stream reads `class11`
    /// when its own bucket is absent. Buckets with no source at all are zero.
    #[must_use]
    pub fn resolve(&self) -> ClassAmounts {
        let senior = self.class11;
        ClassAmounts {
            class9: self.class9.unwrap_or(0),
            class10: self.class10.or(self.class9).unwrap_or(0),
            class11ac: self.class11ac.or(senior).unwrap_or(0),
            class11s: self.class11s.or(senior).unwrap_or(0),
            class12ac: self.class12ac.or(senior).unwrap_or(0),
            class12s: self.class12s.or(senior).unwrap_or(0),
        }
    }
}

/// A fee head as found in a stored schedule. Names and fund tags are not
/// read; migration always takes them from the canonical table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredFeeHead {
    /// Head id
    pub id: u32,
    /// Six-bucket amounts, when saved in the current shape
    #[serde(default)]
    pub amounts: Option<StoredAmounts>,
    /// Two-bucket amounts saved directly on the head
    #[serde(flatten)]
    pub legacy: StoredAmounts,
}

impl StoredFeeHead {
    fn amounts(&self) -> ClassAmounts {
        self.amounts.unwrap_or(self.legacy).resolve()
    }
}

const CANONICAL_HEADS: [(u32, &str, &str, FundType, [u32; 6]); 10] = [
    (1, "Admission Fee", "प्रवेश शुल्क", FundType::StudentFund, [100, 100, 150, 150, 150, 150]),
    (2, "Tuition Fee", "शिक्षण शुल्क", FundType::StudentFund, [240, 240, 300, 360, 300, 360]),
    (3, "Development Fee", "विकास शुल्क", FundType::StudentFund, [200, 200, 250, 250, 250, 250]),
    (4, "Examination Fee", "परीक्षा शुल्क", FundType::StudentFund, [150, 150, 200, 200, 200, 200]),
    (5, "Sports Fee", "खेलकूद शुल्क", FundType::DevelopmentFund, [50, 50, 60, 60, 60, 60]),
    (6, "Library Fee", "पुस्तकालय शुल्क", FundType::DevelopmentFund, [40, 40, 50, 50, 50, 50]),
    (7, "Laboratory Fee", "प्रयोगशाला शुल्क", FundType::DevelopmentFund, [60, 60, 0, 150, 0, 150]),
    (8, "Computer Fee", "कंप्यूटर शुल्क", FundType::DevelopmentFund, [100, 100, 120, 120, 120, 120]),
    (9, "Magazine Fee", "पत्रिका शुल्क", FundType::DevelopmentFund, [20, 20, 20, 20, 20, 20]),
    (10, "Miscellaneous Fee", "विविध शुल्क", FundType::DevelopmentFund, [30, 30, 40, 40, 40, 40]),
];

/// The built-in fee table, in canonical order.
#[must_use]
pub fn canonical_fee_heads() -> Vec<FeeHead> {
    CANONICAL_HEADS
        .iter()
        .map(|&(id, name, name_hi, fund, amounts)| FeeHead {
            id,
            name: name.to_string(),
            name_hi: name_hi.to_string(),
            fund,
            amounts: ClassAmounts::from_array(amounts),
        })
        .collect()
}

/// Migrates a stored schedule onto the canonical head list.
///
/// The output has exactly the canonical heads in canonical order. Stored
/// amounts win for ids present in `stored`; ids unknown to the canonical
/// table are dropped.
#[must_use]
pub fn migrate_fee_heads(stored: &[StoredFeeHead]) -> Vec<FeeHead> {
    canonical_fee_heads()
        .into_iter()
        .map(|canonical| match stored.iter().find(|s| s.id == canonical.id) {
            Some(found) => FeeHead {
                amounts: found.amounts(),
                ..canonical
            },
            None => canonical,
        })
        .collect()
}

async fn load_stored_heads<C>(db: &C, key: &str) -> Result<Option<Vec<StoredFeeHead>>>
where
    C: ConnectionTrait,
{
    let Some(doc) = FeeStructure::find_by_id(key.to_string()).one(db).await? else {
        return Ok(None);
    };
    serde_json::from_value(doc.heads)
        .map(Some)
        .map_err(|e| Error::Database {
            message: format!("fee structure {key} is malformed: {e}"),
        })
}

/// Returns the fee heads that apply to a school in a session.
///
/// Tries the session's schedule, then the school's `default` schedule, and
/// migrates whichever is found first. With neither available (or the store
/// failing) the built-in table is returned as is.
pub async fn resolve_fee_structure<C>(db: &C, school_code: &str, session: &str) -> Vec<FeeHead>
where
    C: ConnectionTrait,
{
    let mut candidates = vec![session];
    if session != session::DEFAULT_SESSION {
        candidates.push(session::DEFAULT_SESSION);
    }

    for candidate in candidates {
        let key = fee_structure::structure_key(school_code, candidate);
        match load_stored_heads(db, &key).await {
            Ok(Some(stored)) => {
                debug!("Using fee structure {key} ({} stored heads)", stored.len());
                return migrate_fee_heads(&stored);
            }
            Ok(None) => debug!("No fee structure stored under {key}"),
            Err(e) => warn!("Ignoring fee structure {key}: {e}"),
        }
    }

    debug!("Falling back to built-in fee table for school {school_code}");
    canonical_fee_heads()
}

/// Saves a school's fee schedule for a session, replacing any previous one.
///
/// `session` may be `"default"` to set the fallback schedule.
pub async fn save_fee_structure<C>(
    db: &C,
    school_code: &str,
    session: &str,
    heads: &[FeeHead],
) -> Result<fee_structure::Model>
where
    C: ConnectionTrait,
{
    session::validate_session(session)?;
    if school_code.trim().is_empty() {
        return Err(Error::InvalidInput {
            message: "School code cannot be empty".to_string(),
        });
    }
    let mut seen = HashSet::new();
    if let Some(dup) = heads.iter().find(|h| !seen.insert(h.id)) {
        return Err(Error::InvalidInput {
            message: format!("Fee head id {} appears more than once", dup.id),
        });
    }

    let key = fee_structure::structure_key(school_code, session);
    let heads_json = serde_json::to_value(heads).map_err(|e| Error::InvalidInput {
        message: format!("Fee heads could not be serialised: {e}"),
    })?;
    let now = Utc::now();

    let saved = if let Some(existing) = FeeStructure::find_by_id(key.clone()).one(db).await? {
        let mut active: fee_structure::ActiveModel = existing.into();
        active.heads = Set(heads_json);
        active.updated_at = Set(now);
        active.update(db).await?
    } else {
        fee_structure::ActiveModel {
            id: Set(key.clone()),
            school_code: Set(school_code.to_string()),
            session: Set(session.to_string()),
            heads: Set(heads_json),
            updated_at: Set(now),
        }
        .insert(db)
        .await?
    };

    info!("Saved fee structure {key} with {} heads", heads.len());
    Ok(saved)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase, RuntimeErr};
    use serde_json::json;

    fn ids(heads: &[FeeHead]) -> Vec<u32> {
        heads.iter().map(|h| h.id).collect()
    }

    #[test]
    fn test_canonical_table_shape() {
        let heads = canonical_fee_heads();
        assert_eq!(ids(&heads), (1..=10).collect::<Vec<_>>());
        assert!(heads[..4].iter().all(|h| h.fund == FundType::StudentFund));
        assert!(heads[4..].iter().all(|h| h.fund == FundType::DevelopmentFund));
        assert_eq!(heads[1].name, "Tuition Fee");
        assert_eq!(heads[2].name, "Development Fee");
    }

    #[test]
    fn test_migration_reorders_and_fills_missing_heads() {
        let stored: Vec<StoredFeeHead> = serde_json::from_value(json!([
            {"id": 5, "name": "Games", "amounts": {"class9": 1, "class10": 2, "class11ac": 3, "class11s": 4, "class12ac": 5, "class12s": 6}},
            {"id": 2, "name": "Old tuition name", "amounts": {"class9": 999, "class10": 999, "class11ac": 999, "class11s": 999, "class12ac": 999, "class12s": 999}},
        ]))
        .unwrap();

        let migrated = migrate_fee_heads(&stored);
        let canonical = canonical_fee_heads();

        assert_eq!(ids(&migrated), ids(&canonical));
        assert_eq!(migrated[1].name, "Tuition Fee");
        assert_eq!(migrated[1].amounts.class9, 999);
        assert_eq!(migrated[4].name, "Sports Fee");
        assert_eq!(migrated[4].amounts.class12s, 6);
        assert_eq!(migrated[0], canonical[0]);
        assert_eq!(migrated[9], canonical[9]);
    }

    #[test]
    fn test_migration_drops_unknown_heads() {
        let stored: Vec<StoredFeeHead> =
            serde_json::from_value(json!([{"id": 42, "amounts": {"class9": 7}}])).unwrap();
        assert_eq!(migrate_fee_heads(&stored), canonical_fee_heads());
    }

    #[test]
    fn test_legacy_two_bucket_amounts_are_mapped() {
        let stored: Vec<StoredFeeHead> =
            serde_json::from_value(json!([{"id": 2, "nameHindi": "x", "class9": 300, "class11": 500}]))
                .unwrap();
        let migrated = migrate_fee_heads(&stored);
        let tuition = &migrated[1].amounts;
        assert_eq!(tuition.class9, 300);
        assert_eq!(tuition.class10, 300);
        assert_eq!(tuition.class11ac, 500);
        assert_eq!(tuition.class11s, 500);
        assert_eq!(tuition.class12ac, 500);
        assert_eq!(tuition.class12s, 500);
    }

    #[tokio::test]
    async fn test_resolve_without_any_stored_document_returns_builtin_table() -> Result<()> {
        let db = setup_test_db().await?;
        let heads = resolve_fee_structure(&db, TEST_SCHOOL, "2024-2025").await;
        assert_eq!(heads, canonical_fee_heads());
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_prefers_session_then_default() -> Result<()> {
        let db = setup_test_db().await?;
        let mut default_heads = canonical_fee_heads();
        default_heads[0].amounts.class9 = 11;
        save_fee_structure(&db, TEST_SCHOOL, "default", &default_heads).await?;

        let from_default = resolve_fee_structure(&db, TEST_SCHOOL, "2024-2025").await;
        assert_eq!(from_default[0].amounts.class9, 11);

        let mut session_heads = canonical_fee_heads();
        session_heads[0].amounts.class9 = 22;
        save_fee_structure(&db, TEST_SCHOOL, "2024-2025", &session_heads).await?;

        let from_session = resolve_fee_structure(&db, TEST_SCHOOL, "2024-2025").await;
        assert_eq!(from_session[0].amounts.class9, 22);

        let other_school = resolve_fee_structure(&db, "99999999999", "2024-2025").await;
        assert_eq!(other_school, canonical_fee_heads());
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_migrates_partial_stored_schedule() -> Result<()> {
        let db = setup_test_db().await?;
        let partial: Vec<FeeHead> = canonical_fee_heads()
            .into_iter()
            .filter(|h| h.id % 2 == 0)
            .rev()
            .map(|mut h| {
                h.name = format!("renamed {}", h.id);
                h
            })
            .collect();
        save_fee_structure(&db, TEST_SCHOOL, "2024-2025", &partial).await?;

        let heads = resolve_fee_structure(&db, TEST_SCHOOL, "2024-2025").await;
        assert_eq!(heads, canonical_fee_heads());
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_swallows_store_errors() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_errors([
                DbErr::Conn(RuntimeErr::Internal("offline".to_string())),
                DbErr::Conn(RuntimeErr::Internal("offline".to_string())),
            ])
            .into_connection();

        let heads = resolve_fee_structure(&db, TEST_SCHOOL, "2024-2025").await;
        assert_eq!(heads, canonical_fee_heads());
    }

    #[tokio::test]
    async fn test_resolve_skips_malformed_document() -> Result<()> {
        let db = setup_test_db().await?;
        fee_structure::ActiveModel {
            id: Set(fee_structure::structure_key(TEST_SCHOOL, "2024-2025")),
            school_code: Set(TEST_SCHOOL.to_string()),
            session: Set("2024-2025".to_string()),
            heads: Set(json!({"not": "a list"})),
            updated_at: Set(Utc::now()),
        }
        .insert(&db)
        .await?;
        let mut default_heads = canonical_fee_heads();
        default_heads[3].amounts.class10 = 5;
        save_fee_structure(&db, TEST_SCHOOL, "default", &default_heads).await?;

        let heads = resolve_fee_structure(&db, TEST_SCHOOL, "2024-2025").await;
        assert_eq!(heads[3].amounts.class10, 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_overwrites_wholesale() -> Result<()> {
        let db = setup_test_db().await?;
        save_fee_structure(&db, TEST_SCHOOL, "2024-2025", &canonical_fee_heads()).await?;
        let only_tuition: Vec<FeeHead> = canonical_fee_heads()
            .into_iter()
            .filter(|h| h.id == 2)
            .collect();
        let saved = save_fee_structure(&db, TEST_SCHOOL, "2024-2025", &only_tuition).await?;

        let stored: Vec<StoredFeeHead> = serde_json::from_value(saved.heads).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(FeeStructure::find().all(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_validation() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = save_fee_structure(&db, TEST_SCHOOL, "2024", &canonical_fee_heads()).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let mut dup = canonical_fee_heads();
        dup.push(dup[0].clone());
        let result = save_fee_structure(&db, TEST_SCHOOL, "2024-2025", &dup).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }
}
