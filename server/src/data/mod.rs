//! Data storage layer
//!
//! - `sqlite` - Default transactional backend (embedded)
//! - `postgres` - Transactional backend for multi-node deployments
//! - `traits` - `TransactionalRepository`, the store interface used by the API
//! - `types` - Row types shared by both backends
//! - `error` - Unified error type for both backends

pub mod error;
pub mod postgres;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use error::DataError;
pub use postgres::PostgresService;
pub use sqlite::SqliteService;
pub use traits::TransactionalRepository;

use std::path::Path;
use std::sync::Arc;

use crate::core::config::{PostgresConfig, TransactionalBackend};

/// Transactional database service enum
///
/// Wraps the backend-specific service. Cloning is cheap (both variants
/// hold an `Arc`).
#[derive(Clone)]
pub enum TransactionalService {
    /// SQLite backend (default, embedded)
    Sqlite(Arc<SqliteService>),
    /// PostgreSQL backend
    Postgres(Arc<PostgresService>),
}

impl TransactionalService {
    /// Initialize the transactional service based on configuration
    pub async fn init(
        backend: TransactionalBackend,
        sqlite_path: &Path,
        postgres_config: Option<&PostgresConfig>,
    ) -> Result<Self, DataError> {
        match backend {
            TransactionalBackend::Sqlite => {
                let service = SqliteService::init(sqlite_path).await?;
                Ok(Self::Sqlite(Arc::new(service)))
            }
            TransactionalBackend::Postgres => {
                let config = postgres_config.ok_or_else(|| {
                    DataError::Config("PostgreSQL configuration required".to_string())
                })?;
                let service = PostgresService::init(config).await?;
                Ok(Self::Postgres(Arc::new(service)))
            }
        }
    }

    /// Get a repository handle for the active backend
    pub fn repository(&self) -> Arc<dyn TransactionalRepository> {
        match self {
            Self::Sqlite(s) => Arc::new(Arc::clone(s)),
            Self::Postgres(p) => Arc::new(Arc::clone(p)),
        }
    }

    /// Close the database connection gracefully
    pub async fn close(&self) {
        match self {
            Self::Sqlite(s) => s.close().await,
            Self::Postgres(p) => p.close().await,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Postgres(_) => "postgres",
        }
    }
}
