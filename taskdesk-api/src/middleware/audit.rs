/// Audit trail middleware
///
/// Writes one audit record per request: method, URL, a redacted snapshot of
/// the JSON body (POST/PUT/PATCH only), response status, the authenticated
/// caller, the client IP and the correlation id.
///
/// The caller is read from the *response* extensions, where the JWT
/// middleware leaves its [`AuthContext`]; this layer sits outside routing so
/// it never sees the request after authentication.
///
/// Failing to store the record is logged and does not affect the response.
/// Bodies that cannot be buffered are rejected (413 over the size limit,
/// 400 otherwise) and still audited, without a snapshot.

use crate::error::ApiError;
use crate::middleware::correlation::CorrelationId;
use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use serde_json::Value as JsonValue;
use std::net::SocketAddr;
use std::sync::Arc;
use taskdesk_shared::auth::middleware::AuthContext;
use taskdesk_shared::models::audit::{body_snapshot, CreateAudit};
use taskdesk_shared::repository::AuditStore;

/// Largest request body buffered for the snapshot
pub const MAX_AUDITED_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Longest client address kept, matching `audits.ip_address`
pub const MAX_IP_ADDRESS_CHARS: usize = 64;

pub async fn audit_middleware(
    State(audits): State<Arc<dyn AuditStore>>,
    req: Request,
    next: Next,
) -> Response {
    let (parts, body) = req.into_parts();
    let pending = PendingAudit::from_parts(&parts);

    let bytes: Bytes = match axum::body::to_bytes(body, MAX_AUDITED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let too_large = std::error::Error::source(&e)
                .is_some_and(|source| source.is::<LengthLimitError>());
            tracing::warn!(error = %e, too_large, "Could not read request body");

            let response = if too_large {
                ApiError::PayloadTooLarge(format!(
                    "Request body exceeds {} bytes",
                    MAX_AUDITED_BODY_BYTES
                ))
            } else {
                ApiError::BadRequest("Request body is unreadable".to_string())
            }
            .into_response();

            let record = pending.into_record(None, &response);
            store_record(audits.as_ref(), record).await;
            return response;
        }
    };

    let request_body = body_snapshot(&pending.method, &bytes);
    let response = next
        .run(Request::from_parts(parts, Body::from(bytes)))
        .await;

    let record = pending.into_record(request_body, &response);
    store_record(audits.as_ref(), record).await;
    response
}

/// Request facts captured before the body is consumed
struct PendingAudit {
    method: String,
    url: String,
    ip_address: Option<String>,
    correlation_id: Option<String>,
}

impl PendingAudit {
    fn from_parts(parts: &Parts) -> Self {
        Self {
            method: parts.method.to_string(),
            url: parts.uri.to_string(),
            ip_address: client_ip(
                &parts.headers,
                parts.extensions.get::<ConnectInfo<SocketAddr>>(),
            ),
            correlation_id: parts
                .extensions
                .get::<CorrelationId>()
                .map(|id| id.as_str().to_string()),
        }
    }

    fn into_record(self, request_body: Option<JsonValue>, response: &Response) -> CreateAudit {
        let caller = response.extensions().get::<AuthContext>();
        CreateAudit {
            user_id: caller.map(|c| c.user_id),
            username: caller.map(|c| c.username.clone()),
            method: self.method,
            url: self.url,
            request_body,
            status_code: i32::from(response.status().as_u16()),
            ip_address: self.ip_address,
            correlation_id: self.correlation_id,
        }
    }
}

async fn store_record(audits: &dyn AuditStore, record: CreateAudit) {
    if let Err(e) = audits.insert(record).await {
        tracing::error!(error = %e, "Failed to write audit record");
    }
}

/// First `x-forwarded-for` hop, else the peer address
///
/// The forwarded value is client-supplied, so it is cut to
/// [`MAX_IP_ADDRESS_CHARS`].
fn client_ip(headers: &HeaderMap, peer: Option<&ConnectInfo<SocketAddr>>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.chars().take(MAX_IP_ADDRESS_CHARS).collect())
        .or_else(|| peer.map(|ConnectInfo(addr)| addr.ip().to_string()))
}
