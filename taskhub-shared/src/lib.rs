//! # TaskHub Shared Library
//!
//! Authentication and ownership-authorization core for the TaskHub API, plus the
//! domain models and persistence collaborators it runs against.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, token service, authentication gate, owner scope
//! - `models`: Users, tasks, projects and pagination types
//! - `store`: Persistence traits with PostgreSQL and in-process implementations
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the TaskHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
