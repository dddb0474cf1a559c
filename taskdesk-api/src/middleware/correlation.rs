/// Correlation id middleware
///
/// Every request gets a correlation id: the caller's `x-correlation-id`
/// header if it sent a usable one, otherwise a fresh UUID v4. The id is
///
/// - stored as a [`CorrelationId`] request extension,
/// - recorded on a `request` span that wraps the rest of the stack, so every
///   log line emitted while handling the request carries it,
/// - echoed back in the `x-correlation-id` response header.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, Router};
/// use taskdesk_api::middleware::correlation::correlation_middleware;
///
/// let app: Router = Router::new().layer(middleware::from_fn(correlation_middleware));
/// ```

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// Request/response header carrying the id
pub const CORRELATION_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// Longest caller-supplied id that is accepted as-is
const MAX_CORRELATION_ID_LENGTH: usize = 128;

/// Correlation id of the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reuses a sane incoming id, else generates one
fn resolve(req: &Request) -> String {
    req.headers()
        .get(&CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_CORRELATION_ID_LENGTH)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub async fn correlation_middleware(mut req: Request, next: Next) -> Response {
    let id = resolve(&req);
    req.extensions_mut().insert(CorrelationId(id.clone()));

    let span = tracing::info_span!(
        "request",
        correlation_id = %id,
        method = %req.method(),
        uri = %req.uri(),
    );

    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}
