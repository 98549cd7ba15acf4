/// Password hashing service using Argon2id
///
/// Hashes are stored as PHC strings, which embed the algorithm, version, cost parameters
/// and salt:
///
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>
/// ```
///
/// Verification reads the parameters back out of the stored string, so the work factor
/// can be raised in configuration without invalidating existing hashes.
///
/// # Security
///
/// - **Algorithm**: Argon2id
/// - **Salt**: 16 random bytes per hash from the OS RNG
/// - **Comparison**: constant-time, performed by the `argon2` crate
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::password::{HashingConfig, PasswordService};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = PasswordService::new(HashingConfig {
///     memory_kib: 1024,
///     iterations: 1,
///     parallelism: 1,
/// })?;
///
/// let hash = service.hash("Str0ng!Pass")?;
/// assert!(service.verify("Str0ng!Pass", &hash)?);
/// assert!(!service.verify("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// The hashing primitive failed or was misconfigured
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Verification failed for a reason other than a mismatch
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored hash is not a valid PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes (the work factor)
    pub iterations: u32,

    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: 65536, // 64 MB
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// Hashes and verifies passwords with a fixed Argon2id configuration
///
/// Built once at startup and shared behind an `Arc`.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    config: HashingConfig,

    /// Hash of a random value, verified against when the login email is unknown
    dummy_hash: String,
}

impl PasswordService {
    /// Creates the service and precomputes the dummy hash
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::HashError` if the parameters are rejected by Argon2
    pub fn new(config: HashingConfig) -> Result<Self, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(config.memory_kib)
            .t_cost(config.iterations)
            .p_cost(config.parallelism)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

        let dummy_salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2
            .hash_password(dummy_salt.as_str().as_bytes(), &dummy_salt)
            .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?
            .to_string();

        Ok(Self {
            argon2,
            config,
            dummy_hash,
        })
    }

    /// Returns the configured cost parameters
    pub fn config(&self) -> HashingConfig {
        self.config
    }

    /// Hashes a plaintext password with a fresh random salt
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::HashError` if the primitive fails. The plaintext is never
    /// returned in place of a hash.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    /// Verifies a password against a stored PHC hash
    ///
    /// Returns `Ok(false)` on mismatch. Errors are reserved for malformed stored hashes.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

        // argon2 reports a missing salt or output as a plain mismatch
        if parsed_hash.salt.is_none() || parsed_hash.hash.is_none() {
            return Err(PasswordError::InvalidHash("Hash has no salt or output".to_string()));
        }

        // Cost parameters come from the parsed hash, not from `self.config`
        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
        }
    }

    /// Spends the same effort as a real verification and always reports a mismatch
    pub fn verify_dummy(&self, password: &str) -> bool {
        let _ = self.verify(password, &self.dummy_hash);
        false
    }
}

/// Validates password strength
///
/// Requires at least 8 characters with an uppercase letter, a lowercase letter,
/// a digit and a symbol.
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::password::validate_password_strength;
///
/// assert!(validate_password_strength("Str0ng!Pass").is_ok());
/// assert!(validate_password_strength("Sh0rt!").is_err());
/// assert!(validate_password_strength("Password123").is_err());
/// ```
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_numeric()) {
        return Err("Password must contain at least one digit".to_string());
    }

    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err("Password must contain at least one special character".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_service() -> PasswordService {
        PasswordService::new(HashingConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .expect("valid parameters")
    }

    #[test]
    fn test_hash_is_self_describing() {
        let hash = cheap_service().hash("test_password_123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=1024"));
        assert!(hash.contains("t=1"));
        assert!(hash.contains("p=1"));
        assert!(!hash.contains("test_password_123"));
    }

    #[test]
    fn test_default_config_costs() {
        let config = HashingConfig::default();
        assert_eq!(config.memory_kib, 65536);
        assert_eq!(config.iterations, 3);
        assert_eq!(config.parallelism, 4);
    }

    #[test]
    fn test_same_password_different_salts() {
        let service = cheap_service();
        let hash1 = service.hash("same_password").unwrap();
        let hash2 = service.hash("same_password").unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_correct_and_incorrect() {
        let service = cheap_service();
        let hash = service.hash("correct_password").unwrap();

        assert!(service.verify("correct_password", &hash).unwrap());
        assert!(!service.verify("wrong_password", &hash).unwrap());
        assert!(!service.verify("", &hash).unwrap());
    }

    #[test]
    fn test_verify_uses_parameters_from_hash() {
        // A hash produced under one work factor still verifies after the factor changes
        let old = cheap_service();
        let hash = old.hash("Str0ng!Pass").unwrap();

        let new = PasswordService::new(HashingConfig {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();

        assert!(new.verify("Str0ng!Pass", &hash).unwrap());
    }

    #[test]
    fn test_verify_malformed_hash_is_error() {
        let service = cheap_service();

        assert!(matches!(
            service.verify("password", "invalid_hash"),
            Err(PasswordError::InvalidHash(_))
        ));
        assert!(service.verify("password", "$argon2id$invalid").is_err());
        assert!(matches!(
            service.verify("password", "$argon2id$v=19$m=1024,t=1,p=1$c2FsdHNhbHRzYWx0"),
            Err(PasswordError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_verify_dummy_never_matches() {
        let service = cheap_service();
        assert!(!service.verify_dummy("anything"));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let result = PasswordService::new(HashingConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });

        assert!(matches!(result, Err(PasswordError::HashError(_))));
    }

    #[test]
    fn test_validate_password_strength() {
        for password in ["MyP@ssw0rd!", "Str0ng!Pass", "C0mpl3x#Pwd"] {
            assert!(validate_password_strength(password).is_ok(), "{}", password);
        }

        assert!(validate_password_strength("Sh0rt!")
            .unwrap_err()
            .contains("at least 8 characters"));
        assert!(validate_password_strength("lowercase1!")
            .unwrap_err()
            .contains("uppercase letter"));
        assert!(validate_password_strength("UPPERCASE1!")
            .unwrap_err()
            .contains("lowercase letter"));
        assert!(validate_password_strength("NoDigits!")
            .unwrap_err()
            .contains("digit"));
        assert!(validate_password_strength("NoSpecial123")
            .unwrap_err()
            .contains("special character"));
    }
}
