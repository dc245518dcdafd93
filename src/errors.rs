//! Unified error types for the admission core.
//!
//! Store errors are classified once, at the `From<DbErr>` boundary, so every
//! `?` on a SeaORM call yields either a [`Error::TransientStore`] (connection
//! trouble the user can act on) or a generic [`Error::Database`].

use sea_orm::DbErr;
use thiserror::Error;

/// Errors surfaced by the admission core.
#[derive(Debug, Error)]
pub enum Error {
    /// Store or application misconfigured, or unreachable at startup.
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// A requested record does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record ("admission", "school")
        entity: &'static str,
        /// Key that was looked up
        key: String,
    },

    /// A manual admission number collides with an existing record.
    #[error("Admission number '{admission_number}' is already in use for this school")]
    DuplicateAdmissionNumber {
        /// The conflicting number
        admission_number: String,
    },

    /// Connection-level store failure.
    #[error("Could not reach the database, check your connection: {message}")]
    TransientStore {
        /// Underlying store message
        message: String,
    },

    /// Any other store failure.
    #[error("Database error: {message}")]
    Database {
        /// Underlying store message
        message: String,
    },

    /// A chunked deletion failed after some chunks were already committed.
    #[error(
        "Bulk deletion stopped after deleting {deleted} records; {remaining} records were not deleted: {message}"
    )]
    PartialBatchFailure {
        /// Records deleted by the chunks that committed
        deleted: u64,
        /// Records left in place
        remaining: u64,
        /// Error from the failing chunk
        message: String,
    },

    /// Caller supplied invalid data.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What was invalid
        message: String,
    },

    /// Attempt to move an admission out of a terminal status.
    #[error("Cannot change admission status from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// The school already has a different owning account.
    #[error("School {udise} is already claimed by another account")]
    SchoolAlreadyClaimed {
        /// School code
        udise: String,
    },
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => Self::TransientStore {
                message: err.to_string(),
            },
            _ => Self::Database {
                message: err.to_string(),
            },
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
