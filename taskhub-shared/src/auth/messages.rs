//! User-facing messages for authentication and ownership failures.
//!
//! Every endpoint must answer with these exact strings so that responses cannot be
//! used to tell "unknown account" from "wrong password", or "missing record" from
//! "record owned by someone else".

/// Login failure, for both unknown email and wrong password
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// No token in the Authorization header or the `token` cookie
pub const NO_TOKEN: &str = "No token provided";

/// Bad signature, expired or unparseable token
pub const INVALID_TOKEN: &str = "Invalid or expired token";

/// Signup with an email that is already registered
pub const EMAIL_TAKEN: &str = "Email already registered";

/// Missing record, or record owned by another principal
pub fn not_found(kind: &str) -> String {
    format!("{} not found", kind)
}
