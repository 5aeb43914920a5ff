//! Error types for store operations

use thiserror::Error;

/// Table provisioning was rejected by the store. Fatal for the run; an
/// invalid schema cannot succeed on retry.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("table creation rejected: {0}")]
    Rejected(#[from] sqlx::Error),
}

/// Row persistence failed, possibly after part of the data was committed.
///
/// `rows_persisted()` distinguishes "zero rows persisted" from "some rows
/// persisted before the failure" — a partial load is an accepted outcome,
/// not corruption.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("bulk load failed after {rows_persisted} of {rows_attempted} rows: {source}")]
    Store {
        rows_attempted: usize,
        rows_persisted: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to serialize rows for bulk copy: {0}")]
    Serialize(#[from] csv::Error),
}

impl LoadError {
    /// Rows durably persisted before the failure.
    pub fn rows_persisted(&self) -> usize {
        match self {
            LoadError::Store { rows_persisted, .. } => *rows_persisted,
            LoadError::Serialize(_) => 0,
        }
    }
}
