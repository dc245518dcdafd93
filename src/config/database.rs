//! Database configuration module.
//!
//! Opens the SeaORM connection that stands in for the document store and creates
//! all tables from the entity definitions with `Schema::create_table_from_entity`,
//! so the stored shape always matches the Rust structs.

use crate::entities::{Admission, AdmissionCounter, FeeStructure, School};
use crate::errors::{Error, Result};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::info;

/// Connects to the store at `database_url`.
///
/// Any failure is reported as `Error::Config`: nothing in the core should run
/// against a store that never came up.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    let db = Database::connect(database_url)
        .await
        .map_err(|e| Error::Config {
            message: format!("Failed to connect to database at {database_url}: {e}"),
        })?;
    info!("Connected to database");
    Ok(db)
}

/// Creates all tables that do not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut school_table = schema.create_table_from_entity(School);
    let mut admission_table = schema.create_table_from_entity(Admission);
    let mut fee_structure_table = schema.create_table_from_entity(FeeStructure);
    let mut counter_table = schema.create_table_from_entity(AdmissionCounter);

    db.execute(builder.build(school_table.if_not_exists())).await?;
    db.execute(builder.build(admission_table.if_not_exists())).await?;
    db.execute(builder.build(fee_structure_table.if_not_exists()))
        .await?;
    db.execute(builder.build(counter_table.if_not_exists())).await?;

    Ok(())
}
