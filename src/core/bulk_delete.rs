//! Bulk deletion of a school's admissions.
//!
//! Deletes in chunks of at most `batch_limit` ids, one committed batch per
//! chunk, strictly one after another. A failing chunk stops the run; chunks
//! already committed stay deleted and the error reports how far it got.
//! Once every chunk is in, the school's admission counters are dropped so the
//! next auto number starts again from the approved count.

use crate::{
    config::app::validate_batch_limit,
    entities::{Admission, AdmissionCounter, admission, admission_counter},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use tracing::{error, info, instrument};

/// Outcome of a bulk deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    /// Records deleted
    pub deleted_count: u64,
    /// Size of each committed batch, in commit order
    pub batches: Vec<usize>,
}

async fn delete_chunk<C>(db: &C, ids: &[i64]) -> Result<u64>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let result = Admission::delete_many()
        .filter(admission::Column::Id.is_in(ids.iter().copied()))
        .exec(&txn)
        .await?;
    txn.commit().await?;
    Ok(result.rows_affected)
}

/// Deletes every admission belonging to a school.
///
/// A school without admissions returns an empty report without touching the
/// store further. On a failed chunk the result is
/// `Error::PartialBatchFailure`; nothing already deleted is restored.
#[instrument(skip(db))]
pub async fn delete_all_admissions_for_school<C>(
    db: &C,
    school_code: &str,
    batch_limit: usize,
) -> Result<DeletionReport>
where
    C: ConnectionTrait + TransactionTrait,
{
    validate_batch_limit(batch_limit)?;

    let ids: Vec<i64> = Admission::find()
        .select_only()
        .column(admission::Column::Id)
        .filter(admission::Column::SchoolCode.eq(school_code))
        .order_by_asc(admission::Column::Id)
        .into_tuple()
        .all(db)
        .await?;

    let mut report = DeletionReport::default();
    if ids.is_empty() {
        info!("No admissions to delete for school {school_code}");
        return Ok(report);
    }
    let total = ids.len() as u64;

    for chunk in ids.chunks(batch_limit) {
        match delete_chunk(db, chunk).await {
            Ok(deleted) => {
                report.deleted_count += deleted;
                report.batches.push(chunk.len());
                info!(
                    "Deleted batch of {deleted} admissions for school {school_code} ({}/{total})",
                    report.deleted_count
                );
            }
            Err(e) => {
                error!(
                    "Bulk deletion for school {school_code} failed after {} records: {e}",
                    report.deleted_count
                );
                return Err(Error::PartialBatchFailure {
                    deleted: report.deleted_count,
                    remaining: total.saturating_sub(report.deleted_count),
                    message: e.to_string(),
                });
            }
        }
    }

    let counters = AdmissionCounter::delete_many()
        .filter(admission_counter::Column::SchoolCode.eq(school_code))
        .exec(db)
        .await
        .map_err(|e| Error::PartialBatchFailure {
            deleted: report.deleted_count,
            remaining: 0,
            message: format!("admissions deleted but counters were kept: {e}"),
        })?;

    info!(
        "Deleted all {} admissions for school {school_code} and reset {} counters",
        report.deleted_count, counters.rows_affected
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::app::MAX_BATCH_OPERATIONS;
    use crate::core::admission::quick_entry_admission;
    use crate::core::admission_number::generate_admission_number;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, RuntimeErr};
    use std::collections::BTreeMap;

    fn id_rows(ids: std::ops::RangeInclusive<i64>) -> Vec<BTreeMap<&'static str, Value>> {
        ids.map(|id| BTreeMap::from([("id", Value::BigInt(Some(id)))]))
            .collect()
    }

    fn exec_ok(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_deletes_in_store_sized_batches() -> Result<()> {
        let db = setup_school_db().await?;
        insert_many_approved(&db, TEST_SCHOOL, 1200).await?;

        let report =
            delete_all_admissions_for_school(&db, TEST_SCHOOL, MAX_BATCH_OPERATIONS).await?;
        assert_eq!(report.deleted_count, 1200);
        assert_eq!(report.batches, vec![500, 500, 200]);
        assert!(Admission::find().all(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_store_receives_one_commit_per_batch() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([id_rows(1..=1200)])
            .append_exec_results([exec_ok(500), exec_ok(500), exec_ok(200), exec_ok(1)])
            .into_connection();

        let report =
            delete_all_admissions_for_school(&db, TEST_SCHOOL, MAX_BATCH_OPERATIONS).await?;
        assert_eq!(report.deleted_count, 1200);

        let log = db.into_transaction_log();
        let batch_sizes: Vec<usize> = log
            .iter()
            .filter(|txn| txn.statements().iter().any(|s| s.sql == "COMMIT"))
            .map(|txn| {
                let delete = txn
                    .statements()
                    .iter()
                    .find(|s| s.sql.starts_with(r#"DELETE FROM "admissions""#))
                    .unwrap();
                delete.values.as_ref().map_or(0, |v| v.0.len())
            })
            .collect();
        assert_eq!(batch_sizes, vec![500, 500, 200]);
        assert!(
            log.last()
                .unwrap()
                .statements()
                .iter()
                .any(|s| s.sql.starts_with(r#"DELETE FROM "admission_counters""#))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_numbering_restarts_after_deleting_everything() -> Result<()> {
        let db = setup_school_db().await?;
        for (day, name) in [(1, "Asha"), (2, "Bina"), (3, "Chetan")] {
            quick_entry_admission(
                &db,
                test_new_admission(TEST_SCHOOL, name),
                date(2024, 4, day),
                None,
            )
            .await?;
        }

        let report = delete_all_admissions_for_school(&db, TEST_SCHOOL, 2).await?;
        assert_eq!(report.deleted_count, 3);
        assert!(AdmissionCounter::find().all(&db).await?.is_empty());

        let number = generate_admission_number(&db, TEST_SCHOOL, 2024, None).await?;
        assert_eq!(number, "ADM/24/0001");
        Ok(())
    }

    #[tokio::test]
    async fn test_other_schools_untouched() -> Result<()> {
        let db = setup_school_db().await?;
        create_test_school(&db, OTHER_SCHOOL).await?;
        insert_many_approved(&db, TEST_SCHOOL, 3).await?;
        insert_many_approved(&db, OTHER_SCHOOL, 2).await?;

        let report = delete_all_admissions_for_school(&db, TEST_SCHOOL, 2).await?;
        assert_eq!(report.deleted_count, 3);
        assert_eq!(report.batches, vec![2, 1]);
        assert_eq!(Admission::find().all(&db).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_school_issues_no_batches() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([id_rows(1..=0)])
            .into_connection();

        let report = delete_all_admissions_for_school(&db, TEST_SCHOOL, 500).await?;
        assert_eq!(report, DeletionReport::default());
        assert_eq!(db.into_transaction_log().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_chunk_reports_partial_progress() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([id_rows(1..=5)])
            .append_exec_results([exec_ok(2)])
            .append_exec_errors([DbErr::Conn(RuntimeErr::Internal(
                "connection reset".to_string(),
            ))])
            .into_connection();

        let result = delete_all_admissions_for_school(&db, TEST_SCHOOL, 2).await;
        match result {
            Err(Error::PartialBatchFailure {
                deleted,
                remaining,
                message,
            }) => {
                assert_eq!(deleted, 2);
                assert_eq!(remaining, 3);
                assert!(message.contains("connection reset"));
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
    }
}
