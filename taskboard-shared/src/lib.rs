//! # Taskboard Shared Library
//!
//! This crate contains the types and business logic shared by the Taskboard
//! API server: database models, connection pooling, and authentication
//! primitives.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, tasks, performer assignments)
//! - `auth`: Password hashing, bearer tokens, authorization rule
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
