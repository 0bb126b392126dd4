//! SQLite repository functions, grouped by entity

pub mod api_key;
pub mod application;
pub mod auth_session;
pub mod team;
pub mod telemetry;
pub mod user;
