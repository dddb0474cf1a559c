//! # TaskDesk API Server Library
//!
//! This library provides the HTTP layer of the TaskDesk task manager.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors that reject with the JSON envelope
//! - `middleware`: Correlation id and audit trail
//! - `response`: `{ message, statusCode, data }` envelope
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
