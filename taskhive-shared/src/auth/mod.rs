/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`token`]: Session token issuance, validation, and revocation
/// - [`identity`]: Bearer token to authenticated user resolution
/// - [`rbac`]: Role-based access checks against membership data
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Tokens**: HS256-signed with a fixed validity window (default 600 s)
/// - **Revocation**: Persisted blacklist consulted on every validation
/// - **Constant-time Comparison**: Password verification never short-circuits

pub mod identity;
pub mod password;
pub mod rbac;
pub mod token;
