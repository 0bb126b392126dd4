//! Authentication and authorization
//!
//! Two guards protect two route families:
//! - [`session::require_session`] - dashboard users, `Bearer <session id>`
//! - [`api_key::require_api_key`] - SDK clients, `[Bearer ]<api key>`
//!
//! Each guard resolves a typed context ([`SessionContext`], [`AppContext`])
//! into the request extensions. Team and application scoped handlers then
//! call the checks in [`hierarchy`].

pub mod api_key;
pub mod context;
pub mod hierarchy;
pub mod session;

pub use api_key::{ApiKeyAuthState, require_api_key};
pub use context::{AppContext, SessionContext};
pub use session::{SessionAuthState, require_session};
