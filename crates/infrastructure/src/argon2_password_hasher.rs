//! Argon2id adapter for the password hashing port.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordVerifier, Version};

use domaris_application::PasswordHasher;
use domaris_core::{AppError, AppResult};

// 19 MiB, two passes, one lane.
const MEMORY_COST_KIB: u32 = 19 * 1024;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;

/// Password hasher producing Argon2id PHC strings.
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    /// Creates a hasher with production cost parameters.
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
            .unwrap_or_else(|_| Params::default());
        Self::with_params(params)
    }

    /// Creates a hasher with explicit cost parameters.
    #[must_use]
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        argon2::PasswordHasher::hash_password(&self.argon2, password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|error| AppError::Internal(format!("failed to hash password: {error}")))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash).map_err(|error| {
            AppError::Internal(format!("stored password hash is malformed: {error}"))
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(error) => Err(AppError::Internal(format!(
                "failed to verify password: {error}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use argon2::Params;
    use domaris_application::PasswordHasher;
    use domaris_core::AppResult;

    use super::Argon2PasswordHasher;

    fn cheap_hasher() -> Argon2PasswordHasher {
        Argon2PasswordHasher::with_params(
            Params::new(Params::MIN_M_COST, 1, 1, None).unwrap_or_default(),
        )
    }

    #[test]
    fn hashes_verify_only_the_original_password() -> AppResult<()> {
        let hasher = cheap_hasher();
        let hash = hasher.hash_password("correct horse battery")?;

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_password("correct horse battery", &hash)?);
        assert!(!hasher.verify_password("incorrect horse", &hash)?);
        Ok(())
    }

    #[test]
    fn malformed_hash_is_an_internal_error() {
        let result = cheap_hasher().verify_password("anything", "plaintext-oops");
        assert!(result.is_err());
    }
}
