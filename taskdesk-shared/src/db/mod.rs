/// Database plumbing
///
/// - `pool`: connection pool creation, health check and shutdown
/// - `migrations`: embedded schema migrations
///
/// Queries themselves live in [`crate::repository::postgres`].

pub mod migrations;
pub mod pool;
