//! # TaskHub API Server Library
//!
//! HTTP surface of the TaskHub task tracker: configuration, error mapping, the router
//! and its middleware, and the route handlers.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Request deadline
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
