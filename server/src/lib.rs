pub mod api;
pub mod app;
pub mod client;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
