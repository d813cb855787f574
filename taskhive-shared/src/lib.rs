//! # TaskHive Shared Library
//!
//! This crate contains the domain model and business logic shared by the
//! TaskHive API server and any future binaries.
//!
//! ## Module Organization
//!
//! - `models`: Database records and their queries
//! - `auth`: Passwords, tokens, identity resolution, and RBAC
//! - `membership`: The invitation/membership state machine
//! - `notify`: Fire-and-forget invitation notifications
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod membership;
pub mod models;
pub mod notify;

/// Current version of the TaskHive shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
