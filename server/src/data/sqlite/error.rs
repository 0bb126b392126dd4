//! SQLite error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqliteError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Expected {expected} row(s) affected but got {actual}")]
    RowCount { expected: u64, actual: u64 },
}

/// Unique violations become `Conflict`, everything else stays a database error
impl From<sqlx::Error> for SqliteError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return Self::Conflict(db.message().to_string());
        }
        Self::Database(e)
    }
}

impl SqliteError {
    /// Require that a statement touched exactly `expected` rows
    pub fn expect_rows(expected: u64, actual: u64) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::RowCount { expected, actual })
        }
    }
}
