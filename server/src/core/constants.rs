// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths, log filters and identifiers)
pub const APP_NAME_LOWER: &str = "observe";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "observe.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "OBSERVE_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "OBSERVE_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "OBSERVE_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "OBSERVE_LOG";

/// Environment variable holding the API key MAC secret
pub const ENV_API_SECRET: &str = "OBSERVE_API_SECRET";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 8080;

/// Maximum accepted request body (collection batches can be large)
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Seconds to wait for the database pool to close during shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Environment Variables - Database
// =============================================================================

/// Transactional backend selection (sqlite | postgres)
pub const ENV_TRANSACTIONAL_BACKEND: &str = "OBSERVE_TRANSACTIONAL_BACKEND";

/// PostgreSQL connection URL
pub const ENV_POSTGRES_URL: &str = "OBSERVE_POSTGRES_URL";

/// SQLite database file path
pub const ENV_SQLITE_PATH: &str = "OBSERVE_SQLITE_PATH";

// =============================================================================
// SQLite
// =============================================================================

/// Default SQLite database path (relative to the working directory)
pub const SQLITE_DEFAULT_PATH: &str = "data/observe.db";

pub const SQLITE_MAX_CONNECTIONS: u32 = 8;
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// PostgreSQL
// =============================================================================

pub const POSTGRES_DEFAULT_MAX_CONNECTIONS: u32 = 20;
pub const POSTGRES_DEFAULT_MIN_CONNECTIONS: u32 = 2;
pub const POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;
pub const POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
pub const POSTGRES_DEFAULT_MAX_LIFETIME_SECS: u64 = 1800;
pub const POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// Credentials
// =============================================================================

/// Random bytes behind every API key and session token
pub const TOKEN_RANDOM_BYTES: usize = 32;

/// Lifetime of an auth session in milliseconds (7 days)
pub const SESSION_TTL_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Role given to the creator of a team
pub const TEAM_OWNER_ROLE: &str = "owner";

// =============================================================================
// Admin CLI client
// =============================================================================

/// Base URL of the server the client talks to
pub const ENV_CLI_BASE_URL: &str = "OBSERVE_CLI_BASE_URL";

/// Session token used by the client for `/app/v1` calls
pub const ENV_CLI_SESSION: &str = "OBSERVE_CLI_SESSION";

pub const DEFAULT_CLI_BASE_URL: &str = "http://localhost:8080";
