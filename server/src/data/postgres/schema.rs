//! PostgreSQL schema definitions

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at BIGINT NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS teams (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS team_users (
    team_id BIGINT NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    role TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_team_users_team_user ON team_users(team_id, user_id);
CREATE INDEX IF NOT EXISTS idx_team_users_user ON team_users(user_id);

CREATE TABLE IF NOT EXISTS auth_sessions (
    id TEXT PRIMARY KEY,
    user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    expiry BIGINT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_auth_sessions_user ON auth_sessions(user_id);

CREATE TABLE IF NOT EXISTS applications (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    team_id BIGINT NOT NULL REFERENCES teams(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_applications_team ON applications(team_id);

CREATE TABLE IF NOT EXISTS api_keys (
    key_hash TEXT PRIMARY KEY,
    app_id BIGINT NOT NULL REFERENCES applications(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS installations (
    id TEXT PRIMARY KEY,
    app_id BIGINT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    sdk_version BIGINT NOT NULL,
    model TEXT NOT NULL,
    brand TEXT NOT NULL,
    created_at BIGINT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_installations_app ON installations(app_id);

CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    installation_id TEXT NOT NULL,
    app_id BIGINT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    created_at BIGINT NOT NULL,
    crashed BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE INDEX IF NOT EXISTS idx_sessions_app ON sessions(app_id);

CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    app_id BIGINT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    event_type TEXT NOT NULL,
    serialized_data TEXT NOT NULL,
    created_at BIGINT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_session ON events(session_id);

CREATE TABLE IF NOT EXISTS traces (
    trace_id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    group_id TEXT NOT NULL,
    parent_id TEXT,
    app_id BIGINT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    status TEXT NOT NULL,
    error_message TEXT NOT NULL,
    started_at BIGINT NOT NULL,
    ended_at BIGINT NOT NULL,
    has_ended BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE INDEX IF NOT EXISTS idx_traces_session ON traces(session_id);

CREATE TABLE IF NOT EXISTS memory_usage (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    installation_id TEXT NOT NULL,
    app_id BIGINT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    free_memory BIGINT NOT NULL,
    used_memory BIGINT NOT NULL,
    max_memory BIGINT NOT NULL,
    total_memory BIGINT NOT NULL,
    available_heap_space BIGINT NOT NULL,
    created_at BIGINT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_memory_usage_session ON memory_usage(session_id);
CREATE INDEX IF NOT EXISTS idx_memory_usage_installation ON memory_usage(installation_id);
"#;
