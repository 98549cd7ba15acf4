/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/signup` - Register a new user
/// - `POST /auth/login` - Verify credentials and issue a session token
/// - `POST /auth/logout` - Clear the session cookie
/// - `GET /auth/protected` - Return the authenticated user (gated)
///
/// Both login failure paths (unknown email, wrong password) return the same 401 message
/// and perform one password verification each.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::{
        messages,
        middleware::{AuthContext, TOKEN_COOKIE},
        password::validate_password_strength,
    },
    models::user::{CreateUser, PublicUser},
};
use validator::Validate;

/// Signup request
#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    /// Display name
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: String,

    /// Email address, used as the login key
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Plaintext password, checked for strength
    pub password: String,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Signup response
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: PublicUser,
}

/// Login request
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Valid email required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: PublicUser,

    /// Session token, also set as the `token` cookie
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Protected endpoint response
#[derive(Debug, Serialize)]
pub struct ProtectedResponse {
    pub message: String,
    pub user: PublicUser,
}

/// Runs CPU-heavy password work off the async executor
async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::InternalError(format!("Blocking task failed: {}", e)))
}

fn session_cookie(token: &str, max_age_seconds: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        TOKEN_COOKIE, token, max_age_seconds
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/signup
/// Content-Type: application/json
///
/// {
///   "name": "Ann",
///   "email": "ann@x.com",
///   "password": "Str0ng!Pass"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "message": "Signup successful",
///   "user": { "id": "uuid", "name": "Ann", "email": "ann@x.com" }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or the email is already registered
/// - `500 Internal Server Error`: Server error
pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    let Json(mut req) = body?;
    req.name = req.name.trim().to_string();
    req.email = req.email.trim().to_string();

    req.validate()?;
    validate_password_strength(&req.password).map_err(|e| ApiError::invalid_field("password", e))?;

    if state.users.find_by_email(&req.email).await?.is_some() {
        tracing::info!(operation = "signup", error_kind = "email_taken", "Signup rejected");
        return Err(ApiError::Conflict(messages::EMAIL_TAKEN.to_string()));
    }

    let passwords = state.passwords.clone();
    let password = req.password;
    let password_hash = run_blocking(move || passwords.hash(&password)).await??;

    // A concurrent signup can still win the race; the store reports it as Duplicate
    let user = state
        .users
        .create(CreateUser::new(&req.name, &req.email, &password_hash))
        .await?;

    tracing::info!(user_id = %user.id, operation = "signup", "User registered");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Signup successful".to_string(),
            user: PublicUser::from(&user),
        }),
    ))
}

/// Login endpoint
///
/// Verifies credentials, issues a session token and sets it as an HttpOnly cookie.
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// {
///   "email": "ann@x.com",
///   "password": "Str0ng!Pass"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "message": "Login successful",
///   "user": { "id": "uuid", "name": "Ann", "email": "ann@x.com" },
///   "token": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body, invalid email or empty password
/// - `401 Unauthorized`: Invalid credentials
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(mut req) = body?;
    req.email = req.email.trim().to_string();
    req.validate()?;

    let user = state.users.find_by_email(&req.email).await?;
    let passwords = state.passwords.clone();
    let password = req.password;

    let user = match user {
        Some(user) => {
            let hash = user.password_hash.clone();
            let matches = run_blocking(move || passwords.verify(&password, &hash)).await??;
            if !matches {
                tracing::info!(
                    user_id = %user.id,
                    operation = "login",
                    error_kind = "password_mismatch",
                    "Login rejected"
                );
                return Err(ApiError::Unauthorized(messages::INVALID_CREDENTIALS.to_string()));
            }
            user
        }
        None => {
            run_blocking(move || passwords.verify_dummy(&password)).await?;
            tracing::info!(operation = "login", error_kind = "unknown_email", "Login rejected");
            return Err(ApiError::Unauthorized(messages::INVALID_CREDENTIALS.to_string()));
        }
    };

    let token = state.tokens.issue(user.id, &user.email)?;
    let cookie = session_cookie(
        &token,
        state.tokens.expires_in().num_seconds(),
        state.config.is_production(),
    );

    tracing::info!(user_id = %user.id, operation = "login", "User logged in");

    let body = Json(LoginResponse {
        message: "Login successful".to_string(),
        user: PublicUser::from(&user),
        token,
    });

    Ok(([(header::SET_COOKIE, cookie)], body).into_response())
}

/// Logout endpoint
///
/// Clears the session cookie. Tokens are stateless, so a copy of the token held
/// elsewhere stays valid until it expires.
pub async fn logout(State(state): State<AppState>) -> Response {
    let cookie = session_cookie("", 0, state.config.is_production());
    let body = Json(MessageResponse {
        message: "Logout successful".to_string(),
    });

    ([(header::SET_COOKIE, cookie)], body).into_response()
}

/// Returns the authenticated user's public profile
///
/// # Errors
///
/// - `401 Unauthorized`: No token, invalid token, or the user no longer exists
pub async fn protected(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProtectedResponse>> {
    let user = state.users.find_by_id(auth.user_id).await?.ok_or_else(|| {
        tracing::info!(user_id = %auth.user_id, operation = "protected", error_kind = "unknown_user", "Request rejected");
        ApiError::Unauthorized(messages::INVALID_TOKEN.to_string())
    })?;

    Ok(Json(ProtectedResponse {
        message: "Access granted".to_string(),
        user: PublicUser::from(&user),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc", 3600, false);
        assert_eq!(cookie, "token=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=3600");

        let cookie = session_cookie("abc", 3600, true);
        assert!(cookie.ends_with("; Secure"));
    }

    #[test]
    fn test_request_debug_redacts_password() {
        let signup = SignupRequest {
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            password: "Str0ng!Pass".to_string(),
        };
        assert!(!format!("{:?}", signup).contains("Str0ng!Pass"));

        let login = LoginRequest {
            email: "ann@x.com".to_string(),
            password: "Str0ng!Pass".to_string(),
        };
        assert!(!format!("{:?}", login).contains("Str0ng!Pass"));
    }

    #[test]
    fn test_signup_validation_rules() {
        let mut req = SignupRequest {
            name: "A".to_string(),
            email: "ann@x.com".to_string(),
            password: "Str0ng!Pass".to_string(),
        };
        assert!(req.validate().is_err());

        req.name = "Ann".to_string();
        assert!(req.validate().is_ok());

        req.email = "not-an-email".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_login_validation_rules() {
        let mut req = LoginRequest {
            email: "ann@x.com".to_string(),
            password: String::new(),
        };
        assert!(req.validate().is_err());

        req.password = "anything".to_string();
        assert!(req.validate().is_ok());

        req.email = "ann".to_string();
        assert!(req.validate().is_err());
    }

    #[tokio::test]
    async fn test_run_blocking_returns_value() {
        let value = run_blocking(|| 40 + 2).await.unwrap();
        assert_eq!(value, 42);
    }
}
