/// Middleware modules for the API server
///
/// - `correlation`: correlation id propagation and the per-request span
/// - `audit`: audit trail of every request

pub mod audit;
pub mod correlation;
