/// Health check endpoint
///
/// Provides a simple health check endpoint that verifies:
/// - The server is running
/// - The database answers
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "message": "Service healthy",
///   "statusCode": 200,
///   "data": {
///     "status": "healthy",
///     "version": "0.1.0",
///     "database": "connected"
///   }
/// }
/// ```
///
/// When the database ping fails the status is `503` and `status` is
/// `"degraded"`.

use crate::{app::AppState, response::ApiResponse};
use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthResponse> {
    let database_ok = match state.health.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    let body = HealthResponse {
        status: if database_ok { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if database_ok { "connected" } else { "disconnected" }.to_string(),
    };

    if database_ok {
        ApiResponse::with_message(StatusCode::OK, "Service healthy", body)
    } else {
        ApiResponse::with_message(StatusCode::SERVICE_UNAVAILABLE, "Service unavailable", body)
    }
}
