/// Authentication and authorization core
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing with a tunable work factor
/// - [`jwt`]: Stateless, expiring HS256 session tokens
/// - [`middleware`]: Authentication gate (header or cookie token → `AuthContext`)
/// - [`authorization`]: Owner scope that constrains every record operation
/// - [`messages`]: User-facing messages shared by every endpoint
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::auth::jwt::TokenService;
/// use taskhub_shared::auth::password::{HashingConfig, PasswordService};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let passwords = PasswordService::new(HashingConfig::default())?;
/// let hash = passwords.hash("Str0ng!Pass")?;
/// assert!(passwords.verify("Str0ng!Pass", &hash)?);
///
/// let tokens = TokenService::new("a-secret-that-is-at-least-32-bytes!!", chrono::Duration::days(1));
/// let token = tokens.issue(Uuid::new_v4(), "ann@x.com")?;
/// let claims = tokens.verify(&token)?;
/// assert_eq!(claims.email, "ann@x.com");
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod messages;
pub mod middleware;
pub mod password;
