use async_trait::async_trait;

use domaris_core::{AppResult, Principal, PrincipalId, Role};

/// Principal together with its stored password hash.
#[derive(Debug, Clone)]
pub struct PrincipalCredentials {
    /// Stored principal.
    pub principal: Principal,
    /// Argon2id PHC string.
    pub password_hash: String,
}

/// Input for persisting a new principal.
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    /// Display name.
    pub display_name: String,
    /// Canonical lowercase email.
    pub email: String,
    /// Initial role.
    pub role: Role,
    /// Argon2id PHC string.
    pub password_hash: String,
}

/// Repository port for principal persistence.
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Finds a principal by id.
    async fn find_by_id(&self, principal_id: PrincipalId) -> AppResult<Option<Principal>>;

    /// Finds a principal by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Principal>>;

    /// Finds a principal and its password hash by email (case-insensitive).
    async fn find_credentials_by_email(&self, email: &str)
    -> AppResult<Option<PrincipalCredentials>>;

    /// Lists every principal ordered by id.
    async fn list(&self) -> AppResult<Vec<Principal>>;

    /// Creates a principal. Fails with `Conflict` when the email is taken.
    async fn create(&self, principal: NewPrincipal) -> AppResult<Principal>;

    /// Replaces the principal's role. Fails with `NotFound` for unknown ids.
    async fn set_role(&self, principal_id: PrincipalId, role: Role) -> AppResult<Principal>;

    /// Enables or disables the principal. Fails with `NotFound` for unknown ids.
    async fn set_active(&self, principal_id: PrincipalId, is_active: bool)
    -> AppResult<Principal>;
}

/// Port for password hashing operations.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}
