//! API route handlers

pub mod apps;
pub mod auth;
pub mod health;
pub mod ingest;
pub mod teams;
pub mod telemetry;
