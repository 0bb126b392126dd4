//! Unified error type for data layer
//!
//! Wraps the backend-specific errors of the SQLite and PostgreSQL services
//! while keeping the classification callers branch on (`Conflict`,
//! `RowCount`).

use thiserror::Error;

/// Unified error type for data layer operations
#[derive(Error, Debug)]
pub enum DataError {
    /// SQLite database error (transactional backend)
    #[error("SQLite error: {0}")]
    Sqlite(sqlx::Error),

    /// PostgreSQL database error (transactional backend)
    #[error("PostgreSQL error: {0}")]
    Postgres(sqlx::Error),

    /// Migration failed
    #[error("Migration {version} ({name}) failed on {backend}: {error}")]
    MigrationFailed {
        backend: &'static str,
        version: i32,
        name: String,
        error: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unique constraint violated (duplicate id, duplicate user name)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A statement touched a different number of rows than required
    #[error("Expected {expected} row(s) affected but got {actual}")]
    RowCount { expected: u64, actual: u64 },
}

impl DataError {
    /// Get the backend name that generated this error
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Postgres(_) => "postgres",
            Self::MigrationFailed { backend, .. } => backend,
            Self::Config(_) | Self::Io(_) | Self::Conflict(_) | Self::RowCount { .. } => {
                "unknown"
            }
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<crate::data::sqlite::SqliteError> for DataError {
    fn from(e: crate::data::sqlite::SqliteError) -> Self {
        use crate::data::sqlite::SqliteError;
        match e {
            SqliteError::Database(e) => Self::Sqlite(e),
            SqliteError::MigrationFailed {
                version,
                name,
                error,
            } => Self::MigrationFailed {
                backend: "sqlite",
                version,
                name,
                error,
            },
            SqliteError::Io(e) => Self::Io(e),
            SqliteError::Conflict(msg) => Self::Conflict(msg),
            SqliteError::RowCount { expected, actual } => Self::RowCount { expected, actual },
        }
    }
}

impl From<crate::data::postgres::PostgresError> for DataError {
    fn from(e: crate::data::postgres::PostgresError) -> Self {
        use crate::data::postgres::PostgresError;
        match e {
            PostgresError::Database(e) => Self::Postgres(e),
            PostgresError::MigrationFailed {
                version,
                name,
                error,
            } => Self::MigrationFailed {
                backend: "postgres",
                version,
                name,
                error,
            },
            PostgresError::Config(msg) => Self::Config(msg),
            PostgresError::Conflict(msg) => Self::Conflict(msg),
            PostgresError::RowCount { expected, actual } => Self::RowCount { expected, actual },
        }
    }
}
