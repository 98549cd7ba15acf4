/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup, login, logout and the protected identity check
/// - `tasks`: Task CRUD, scoped to the caller
/// - `projects`: Project CRUD and statistics, scoped to the caller

pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
