/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, logout
/// - `projects`: Project lifecycle and project-scoped membership
/// - `teams`: Team lifecycle and team-scoped membership
/// - `roles`: Role and permission management
/// - `tasks`: Tasks and comments

pub mod auth;
pub mod health;
pub mod projects;
pub mod roles;
pub mod tasks;
pub mod teams;
