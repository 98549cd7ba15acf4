/// Session token issuance and verification
///
/// Tokens are HS256-signed JWTs binding a principal id and email. They are stateless:
/// validity depends only on the signature and the embedded expiry.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiry**: fixed window from issuance (default 1 day), no leeway
/// - **Secret**: process-wide, loaded once at startup, at least 32 bytes
///
/// # Claims
///
/// - `sub`: principal id
/// - `email`: principal email
/// - `iss`: always `"taskhub"`
/// - `iat` / `exp`: Unix timestamps
/// - `jti`: unique token id, reserved for a future denylist
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::jwt::TokenService;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = TokenService::new("test-secret-key-at-least-32-bytes-long", chrono::Duration::days(1));
/// let user_id = Uuid::new_v4();
///
/// let token = service.issue(user_id, "ann@x.com")?;
/// let claims = service.verify(&token)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim stamped on every token
pub const ISSUER: &str = "taskhub";

/// Default token lifetime
pub fn default_expiry() -> Duration {
    Duration::days(1)
}

/// Error type for JWT operations
///
/// Callers must report every verification variant with the same generic message.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to sign a token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature does not match the configured secret
    #[error("Token signature is invalid")]
    InvalidSignature,

    /// Current time is at or past the expiry
    #[error("Token has expired")]
    Expired,

    /// Token could not be parsed or is missing required claims
    #[error("Invalid token format: {0}")]
    Malformed(String),
}

impl JwtError {
    /// Short label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            JwtError::CreateError(_) => "create_error",
            JwtError::InvalidSignature => "invalid_signature",
            JwtError::Expired => "expired",
            JwtError::Malformed(_) => "malformed",
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - principal id
    pub sub: Uuid,

    /// Principal email (denormalized)
    pub email: String,

    /// Issuer - always "taskhub"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Unique token id
    pub jti: Uuid,
}

impl Claims {
    /// Builds claims issued at `now` that expire after `expires_in`
    pub fn issued_at(user_id: Uuid, email: &str, now: DateTime<Utc>, expires_in: Duration) -> Self {
        Self {
            sub: user_id,
            email: email.to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            jti: Uuid::new_v4(),
        }
    }

    /// Checks expiry against the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Signs claims with the given secret
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    sign(claims, &key)
}

fn sign(claims: &Claims, key: &EncodingKey) -> Result<String, JwtError> {
    encode(&Header::new(Algorithm::HS256), claims, key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "sub", "iss"]);
    validation.leeway = 0;
    // Expiry is checked by `TokenService::verify_at` against an explicit clock
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation
}

fn classify(err: jsonwebtoken::errors::Error) -> JwtError {
    match err.kind() {
        ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::Malformed(err.to_string()),
    }
}

/// Issues and verifies session tokens with a fixed secret and expiry window
///
/// Constructed once from configuration and shared by the login route and the
/// authentication gate. Holds no mutable state.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service for the given secret and expiry window
    pub fn new(secret: &str, expires_in: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in,
        }
    }

    /// Token lifetime
    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// Issues a token for the principal, valid from now
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, JwtError> {
        self.issue_at(user_id, email, Utc::now())
    }

    /// Issues a token as if the current time were `now`
    pub fn issue_at(&self, user_id: Uuid, email: &str, now: DateTime<Utc>) -> Result<String, JwtError> {
        let claims = Claims::issued_at(user_id, email, now, self.expires_in);
        sign(&claims, &self.encoding_key)
    }

    /// Verifies a token against the current time
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies signature and structure, then expiry against `now`
    ///
    /// # Errors
    ///
    /// - `JwtError::InvalidSignature` if signed with another secret
    /// - `JwtError::Expired` if `now >= exp`
    /// - `JwtError::Malformed` if the token cannot be parsed
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &validation()).map_err(classify)?;
        let claims = token_data.claims;

        if claims.is_expired_at(now) {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn service() -> TokenService {
        TokenService::new(SECRET, default_expiry())
    }

    #[test]
    fn test_default_expiry_is_one_day() {
        assert_eq!(default_expiry(), Duration::hours(24));
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = service().issue(user_id, "ann@x.com").expect("Should create token");

        let claims = service().verify(&token).expect("Should validate token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "ann@x.com");
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, 86400);
    }

    #[test]
    fn test_each_token_has_unique_id() {
        let user_id = Uuid::new_v4();
        let a = service().verify(&service().issue(user_id, "a@x.com").unwrap()).unwrap();
        let b = service().verify(&service().issue(user_id, "a@x.com").unwrap()).unwrap();

        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_valid_until_just_before_expiry() {
        let issued = Utc::now();
        let token = service().issue_at(Uuid::new_v4(), "ann@x.com", issued).unwrap();

        let just_before = issued + default_expiry() - Duration::seconds(1);
        assert!(service().verify_at(&token, just_before).is_ok());
    }

    #[test]
    fn test_expired_at_expiry_instant() {
        let issued = Utc::now();
        let token = service().issue_at(Uuid::new_v4(), "ann@x.com", issued).unwrap();

        let at_expiry = issued + default_expiry();
        assert!(matches!(service().verify_at(&token, at_expiry), Err(JwtError::Expired)));

        let after = at_expiry + Duration::hours(5);
        assert!(matches!(service().verify_at(&token, after), Err(JwtError::Expired)));
    }

    #[test]
    fn test_token_issued_in_the_past_is_expired_now() {
        let issued = Utc::now() - Duration::days(2);
        let token = service().issue_at(Uuid::new_v4(), "ann@x.com", issued).unwrap();

        let err = service().verify(&token).unwrap_err();
        assert!(matches!(err, JwtError::Expired));
        assert_eq!(err.kind(), "expired");
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let token = TokenService::new("another-secret-key-at-least-32-bytes", default_expiry())
            .issue(Uuid::new_v4(), "ann@x.com")
            .unwrap();

        assert!(matches!(service().verify(&token), Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_garbage_is_malformed() {
        for token in ["", "not-a-token", "a.b.c", "eyJhbGciOiJIUzI1NiJ9.e30"] {
            assert!(
                matches!(service().verify(token), Err(JwtError::Malformed(_))),
                "{:?} should be malformed",
                token
            );
        }
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let mut claims = Claims::issued_at(Uuid::new_v4(), "ann@x.com", Utc::now(), default_expiry());
        claims.iss = "someone-else".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn test_create_token_verifies_with_same_secret() {
        let claims = Claims::issued_at(Uuid::new_v4(), "ann@x.com", Utc::now(), Duration::hours(1));
        let token = create_token(&claims, SECRET).unwrap();

        assert_eq!(service().verify(&token).unwrap(), claims);
    }

    #[test]
    fn test_debug_hides_keys() {
        let rendered = format!("{:?}", service());
        assert!(!rendered.contains(SECRET));
    }
}
