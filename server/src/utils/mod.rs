//! Utility functions for the application

pub mod credentials;
pub mod password;
