/// Database models for TaskHive
///
/// This module contains all database records and their queries.
///
/// # Models
///
/// - `user`: User accounts
/// - `project`: Top-level collaboration scope, owned by one user
/// - `team`: Sub-scope of a project
/// - `membership`: User-to-scope join records with role and lifecycle status
/// - `role`: Named roles and their permissions
/// - `task`: Work items belonging to a team
/// - `comment`: Task comments
/// - `activity_log`: Append-only audit trail
/// - `blacklisted_token`: Revoked session tokens

pub mod activity_log;
pub mod blacklisted_token;
pub mod comment;
pub mod membership;
pub mod project;
pub mod role;
pub mod task;
pub mod team;
pub mod user;
