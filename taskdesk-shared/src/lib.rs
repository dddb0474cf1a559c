//! # TaskDesk Shared Library
//!
//! Domain types and business logic behind the TaskDesk API.
//!
//! ## Module Organization
//!
//! - `models`: users, tasks and audit records
//! - `repository`: generic filter/sort/page repository with PostgreSQL and
//!   in-memory backends
//! - `auth`: password hashing, JWTs, bearer middleware and authorization
//! - `services`: auth, task and user operations
//! - `db`: connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod repository;
pub mod services;

/// Current version of the TaskDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
