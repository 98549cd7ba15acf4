/// Authentication gate for Axum
///
/// Resolves the caller's identity from a session token before any protected handler
/// runs. The token is read from the `Authorization: Bearer <token>` header, falling back
/// to a `token` cookie. On success an [`AuthContext`] is inserted into the request
/// extensions; on failure the request is rejected with 401 and the handler never runs.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Extension, Router};
/// use taskhub_shared::auth::jwt::TokenService;
/// use taskhub_shared::auth::middleware::{auth_gate, AuthContext};
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.email)
/// }
///
/// let tokens = Arc::new(TokenService::new("secret-key-at-least-32-bytes-long!!", chrono::Duration::days(1)));
/// let app: Router = Router::new()
///     .route("/protected", get(handler))
///     .layer(middleware::from_fn_with_state(tokens, auth_gate));
/// ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::TokenService;
use super::messages;

/// Name of the cookie carrying the session token
pub const TOKEN_COOKIE: &str = "token";

/// Identity bound to a request after successful authentication
///
/// Handlers extract it with `Extension<AuthContext>`. It is the only source of the
/// owner id used by the authorization layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated principal id
    pub user_id: Uuid,

    /// Principal email as recorded in the token
    pub email: String,
}

/// Error type for the authentication gate
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// Neither a bearer header nor a token cookie was present
    #[error("{}", messages::NO_TOKEN)]
    NoToken,

    /// Token failed verification (signature, expiry or format)
    #[error("{}", messages::INVALID_TOKEN)]
    InvalidToken,
}

impl GateError {
    pub fn message(&self) -> &'static str {
        match self {
            GateError::NoToken => messages::NO_TOKEN,
            GateError::InvalidToken => messages::INVALID_TOKEN,
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": "unauthorized",
            "message": self.message(),
        }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Reads a cookie value by name from a `Cookie` header value
pub fn parse_cookie(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        if key.trim() == name {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| parse_cookie(v, TOKEN_COOKIE))
        .filter(|token| !token.is_empty())
}

/// Finds the session token, preferring the bearer header over the cookie
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_token(headers))
}

/// Resolves the caller's identity from request headers
///
/// # Errors
///
/// - `GateError::NoToken` if no token is present
/// - `GateError::InvalidToken` for any verification failure
pub fn authenticate(tokens: &TokenService, headers: &HeaderMap) -> Result<AuthContext, GateError> {
    let token = extract_token(headers).ok_or_else(|| {
        tracing::debug!(operation = "authenticate", error_kind = "no_token", "Request rejected");
        GateError::NoToken
    })?;

    let claims = tokens.verify(&token).map_err(|e| {
        tracing::debug!(operation = "authenticate", error_kind = e.kind(), "Request rejected");
        GateError::InvalidToken
    })?;

    Ok(AuthContext {
        user_id: claims.sub,
        email: claims.email,
    })
}

/// Authentication gate middleware
///
/// Use with `axum::middleware::from_fn_with_state`, passing the shared `TokenService`.
pub async fn auth_gate(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, GateError> {
    let auth = authenticate(&tokens, req.headers())?;

    tracing::Span::current().record("user_id", tracing::field::display(auth.user_id));
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
