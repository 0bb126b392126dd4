use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::cli::CliConfig;
use super::constants::{
    CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_PORT, POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS,
    POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS, POSTGRES_DEFAULT_MAX_CONNECTIONS,
    POSTGRES_DEFAULT_MAX_LIFETIME_SECS, POSTGRES_DEFAULT_MIN_CONNECTIONS,
    POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS, SQLITE_DEFAULT_PATH,
};

// =============================================================================
// Transactional Backend Enum (SQLite or PostgreSQL)
// =============================================================================

/// Database backend holding users, teams, applications and telemetry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionalBackend {
    #[default]
    Sqlite,
    Postgres,
}

impl fmt::Display for TransactionalBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionalBackend::Sqlite => write!(f, "sqlite"),
            TransactionalBackend::Postgres => write!(f, "postgres"),
        }
    }
}

// =============================================================================
// File Config (JSON)
// =============================================================================

/// Server configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Auth configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuthFileConfig {
    /// Secret used to MAC API keys (or use OBSERVE_API_SECRET env var)
    pub api_secret: Option<String>,
}

/// PostgreSQL configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostgresFileConfig {
    /// PostgreSQL connection URL (or use OBSERVE_POSTGRES_URL env var)
    pub url: Option<String>,
    /// Maximum number of connections in the pool (default: 20)
    pub max_connections: Option<u32>,
    /// Minimum number of connections to keep warm (default: 2)
    pub min_connections: Option<u32>,
    /// Connection acquire timeout in seconds (default: 30)
    pub acquire_timeout_secs: Option<u64>,
    /// Idle connection timeout in seconds (default: 600)
    pub idle_timeout_secs: Option<u64>,
    /// Max connection lifetime in seconds (default: 1800)
    pub max_lifetime_secs: Option<u64>,
    /// Statement timeout in seconds (default: 60)
    pub statement_timeout_secs: Option<u64>,
}

/// Database configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    /// Transactional backend: sqlite (default) or postgres
    pub transactional: Option<TransactionalBackend>,
    /// SQLite database file (default: data/observe.db)
    pub sqlite_path: Option<PathBuf>,
    pub postgres: Option<PostgresFileConfig>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub auth: Option<AuthFileConfig>,
    pub database: Option<DatabaseFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }
}

// =============================================================================
// Resolved Config
// =============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub api_secret: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// PostgreSQL pool settings; zero values fall back to the defaults
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub statement_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub transactional: TransactionalBackend,
    pub sqlite_path: PathBuf,
    /// Present only when a URL was configured
    pub postgres: Option<PostgresConfig>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Local `observe.json` OR CLI-specified config path
    /// 3. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let config_path = if let Some(ref path) = cli.config {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.clone())
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        let file_config = match config_path {
            Some(path) => {
                let config = FileConfig::load_from_file(&path)?;
                config.warn_unknown_fields();
                config
            }
            None => FileConfig::default(),
        };

        let config = Self::resolve(cli, file_config);
        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            backend = %config.database.transactional,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn resolve(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_auth = file_config.auth.unwrap_or_default();
        let file_database = file_config.database.unwrap_or_default();
        let file_postgres = file_database.postgres.unwrap_or_default();

        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);

        let api_secret = cli
            .api_secret
            .clone()
            .or(file_auth.api_secret)
            .unwrap_or_default();

        let transactional = cli
            .transactional_backend
            .or(file_database.transactional)
            .unwrap_or_default();

        let sqlite_path = cli
            .sqlite_path
            .clone()
            .or(file_database.sqlite_path)
            .unwrap_or_else(|| PathBuf::from(SQLITE_DEFAULT_PATH));

        let postgres = cli
            .postgres_url
            .clone()
            .or(file_postgres.url)
            .filter(|url| !url.is_empty())
            .map(|url| PostgresConfig {
                url,
                max_connections: file_postgres
                    .max_connections
                    .unwrap_or(POSTGRES_DEFAULT_MAX_CONNECTIONS),
                min_connections: file_postgres
                    .min_connections
                    .unwrap_or(POSTGRES_DEFAULT_MIN_CONNECTIONS),
                acquire_timeout_secs: file_postgres
                    .acquire_timeout_secs
                    .unwrap_or(POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS),
                idle_timeout_secs: file_postgres
                    .idle_timeout_secs
                    .unwrap_or(POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS),
                max_lifetime_secs: file_postgres
                    .max_lifetime_secs
                    .unwrap_or(POSTGRES_DEFAULT_MAX_LIFETIME_SECS),
                statement_timeout_secs: file_postgres
                    .statement_timeout_secs
                    .unwrap_or(POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS),
            });

        Self {
            server: ServerConfig { host, port },
            auth: AuthConfig { api_secret },
            database: DatabaseConfig {
                transactional,
                sqlite_path,
                postgres,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }

        // Port 0 would bind a random port
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        if self.auth.api_secret.is_empty() {
            anyhow::bail!(
                "Configuration error: auth.api_secret is required (set OBSERVE_API_SECRET)"
            );
        }

        if self.database.transactional == TransactionalBackend::Postgres
            && self.database.postgres.is_none()
        {
            anyhow::bail!(
                "Configuration error: database.postgres.url is required when database.transactional is 'postgres'"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with_secret() -> CliConfig {
        CliConfig {
            api_secret: Some("secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_transactional_backend_serde() {
        let backend: TransactionalBackend = serde_json::from_str(r#""postgres""#).unwrap();
        assert_eq!(backend, TransactionalBackend::Postgres);
        assert_eq!(TransactionalBackend::Sqlite.to_string(), "sqlite");
        assert_eq!(TransactionalBackend::default(), TransactionalBackend::Sqlite);
    }

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "server": { "host": "0.0.0.0", "port": 9000 },
            "auth": { "api_secret": "s3cret" },
            "database": {
                "transactional": "postgres",
                "postgres": { "url": "postgres://localhost/observe", "max_connections": 5 }
            }
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        let server = config.server.as_ref().unwrap();
        assert_eq!(server.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(server.port, Some(9000));
        assert_eq!(
            config.auth.as_ref().unwrap().api_secret.as_deref(),
            Some("s3cret")
        );
        let database = config.database.as_ref().unwrap();
        assert_eq!(database.transactional, Some(TransactionalBackend::Postgres));
        assert_eq!(
            database.postgres.as_ref().unwrap().max_connections,
            Some(5)
        );
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "server": { "host": "localhost" }, "unknown_field": 123 }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.extra.get("unknown_field").unwrap(), 123);
    }

    #[test]
    fn test_resolve_defaults() {
        let config = AppConfig::resolve(&cli_with_secret(), FileConfig::default());
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.database.transactional, TransactionalBackend::Sqlite);
        assert_eq!(
            config.database.sqlite_path,
            PathBuf::from(SQLITE_DEFAULT_PATH)
        );
        assert!(config.database.postgres.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_cli_overrides_file() {
        let file: FileConfig =
            serde_json::from_str(r#"{ "server": { "host": "0.0.0.0", "port": 9000 } }"#)
                .unwrap();
        let cli = CliConfig {
            port: Some(7000),
            ..cli_with_secret()
        };
        let config = AppConfig::resolve(&cli, file);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_postgres_defaults_applied() {
        let cli = CliConfig {
            transactional_backend: Some(TransactionalBackend::Postgres),
            postgres_url: Some("postgres://localhost/observe".to_string()),
            ..cli_with_secret()
        };
        let config = AppConfig::resolve(&cli, FileConfig::default());
        let postgres = config.database.postgres.as_ref().unwrap();
        assert_eq!(postgres.max_connections, POSTGRES_DEFAULT_MAX_CONNECTIONS);
        assert_eq!(
            postgres.statement_timeout_secs,
            POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_secret() {
        let config = AppConfig::resolve(&CliConfig::default(), FileConfig::default());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("api_secret"));
    }

    #[test]
    fn test_validate_postgres_without_url() {
        let cli = CliConfig {
            transactional_backend: Some(TransactionalBackend::Postgres),
            ..cli_with_secret()
        };
        let config = AppConfig::resolve(&cli, FileConfig::default());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_port_zero() {
        let cli = CliConfig {
            port: Some(0),
            ..cli_with_secret()
        };
        let config = AppConfig::resolve(&cli, FileConfig::default());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_auth_config_debug_redacts_secret() {
        let auth = AuthConfig {
            api_secret: "hunter2".to_string(),
        };
        assert!(!format!("{:?}", auth).contains("hunter2"));
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(
            &path,
            r#"{ "server": { "port": 9100 }, "auth": { "api_secret": "from-file" } }"#,
        )
        .unwrap();

        let cli = CliConfig {
            config: Some(path),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.auth.api_secret, "from-file");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/observe.json")),
            ..Default::default()
        };
        assert!(AppConfig::load(&cli).is_err());
    }
}
