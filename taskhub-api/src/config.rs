/// Configuration management for the API server
///
/// Configuration is read from environment variables once at startup and passed
/// explicitly to the router state. A `.env` file is honoured in development.
///
/// # Environment Variables
///
/// - `APP_ENV`: `development` (default) or `production`
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `DATABASE_URL`: PostgreSQL connection string. Optional in development, where the
///   in-process store is used without it; required in production.
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Token signing secret, at least 32 characters (required)
/// - `JWT_EXPIRY_SECONDS`: Token lifetime (default: 86400)
/// - `PASSWORD_HASH_MEMORY_KIB`: Argon2 memory cost (default: 65536)
/// - `PASSWORD_HASH_ITERATIONS`: Argon2 work factor (default: 3)
/// - `PASSWORD_HASH_PARALLELISM`: Argon2 lanes (default: 4)
/// - `REQUEST_TIMEOUT_SECONDS`: Per-request deadline (default: 30)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: http://localhost:3000)
///
/// # Example
///
/// ```no_run
/// use taskhub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::{env, str::FromStr, time::Duration};

use anyhow::Context;
use taskhub_shared::{auth::password::HashingConfig, db::pool::DatabaseConfig};

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_SECRET_LEN: usize = 32;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => anyhow::bail!("APP_ENV must be 'development' or 'production', got '{}'", other),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,

    /// API server configuration
    pub api: ApiConfig,

    /// `None` selects the in-process store
    pub database: Option<DatabaseConfig>,

    /// Token configuration
    pub jwt: JwtConfig,

    /// Password hashing cost
    pub password: HashingConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,

    pub port: u16,

    /// Allowed CORS origins
    pub cors_origins: Vec<String>,

    /// Deadline for a whole request
    pub request_timeout: Duration,
}

/// Token configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Signing secret. Never logged.
    pub secret: String,

    /// Token lifetime in seconds
    pub expiry_seconds: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiry_seconds", &self.expiry_seconds)
            .finish()
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value", key)),
        None => Ok(default),
    }
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET` is missing or shorter than 32 characters
    /// - `DATABASE_URL` is missing in production
    /// - A numeric variable cannot be parsed
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let environment = match lookup("APP_ENV") {
            Some(raw) => raw.parse::<Environment>()?,
            None => Environment::Development,
        };

        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or::<u16>(&lookup, "API_PORT", 8080)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let timeout_seconds = parse_or::<u64>(&lookup, "REQUEST_TIMEOUT_SECONDS", 30)?;
        if timeout_seconds == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECONDS must be greater than zero");
        }

        let database = match lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => Some(DatabaseConfig {
                max_connections: parse_or::<u32>(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
                ..DatabaseConfig::new(url)
            }),
            None if environment == Environment::Production => {
                anyhow::bail!("DATABASE_URL environment variable is required in production")
            }
            None => None,
        };

        let secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if secret.chars().count() < MIN_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_SECRET_LEN);
        }

        let expiry_seconds = parse_or::<i64>(&lookup, "JWT_EXPIRY_SECONDS", 86_400)?;
        if expiry_seconds <= 0 {
            anyhow::bail!("JWT_EXPIRY_SECONDS must be greater than zero");
        }

        let defaults = HashingConfig::default();
        let password = HashingConfig {
            memory_kib: parse_or(&lookup, "PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&lookup, "PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&lookup, "PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
        };

        Ok(Self {
            environment,
            api: ApiConfig {
                host,
                port,
                cors_origins,
                request_timeout: Duration::from_secs(timeout_seconds),
            },
            database,
            jwt: JwtConfig {
                secret,
                expiry_seconds,
            },
            password,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Token lifetime
    pub fn token_expiry(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.jwt.expiry_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.api.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.api.request_timeout, Duration::from_secs(30));
        assert!(config.database.is_none());
        assert_eq!(config.jwt.expiry_seconds, 86_400);
        assert_eq!(config.token_expiry(), chrono::Duration::days(1));
        assert_eq!(config.password, HashingConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "9000"),
            ("DATABASE_URL", "postgresql://localhost/taskhub"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("JWT_EXPIRY_SECONDS", "3600"),
            ("PASSWORD_HASH_ITERATIONS", "5"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
            ("REQUEST_TIMEOUT_SECONDS", "5"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.database.as_ref().unwrap().max_connections, 4);
        assert_eq!(config.jwt.expiry_seconds, 3600);
        assert_eq!(config.password.iterations, 5);
        assert_eq!(config.api.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.api.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_secret_required_and_long_enough() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        let err = load(&[("JWT_SECRET", "short")]).unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_production_requires_database() {
        let err = load(&[("JWT_SECRET", SECRET), ("APP_ENV", "production")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("APP_ENV", "production"),
            ("DATABASE_URL", "postgresql://localhost/taskhub"),
        ])
        .unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let err = load(&[("JWT_SECRET", SECRET), ("API_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("API_PORT"));

        assert!(load(&[("JWT_SECRET", SECRET), ("JWT_EXPIRY_SECONDS", "0")]).is_err());
        assert!(load(&[("JWT_SECRET", SECRET), ("APP_ENV", "staging")]).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();
        assert!(!format!("{:?}", config).contains(SECRET));
    }
}
