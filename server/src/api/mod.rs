//! HTTP API layer
//!
//! - `server` - router assembly and serving
//! - `auth` - session and API key guards, team membership checks
//! - `routes` - handlers per route family
//! - `extractors` - JSON body and path extractors with validation
//! - `types` - `ApiError` and shared response bodies

pub mod auth;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use server::{ApiServer, build_router};
