/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh, me)
/// - `tasks`: Task CRUD
/// - `users`: User directory

pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;
