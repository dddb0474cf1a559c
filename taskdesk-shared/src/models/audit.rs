/// Audit trail model
///
/// One row per HTTP request handled by the API. Rows are only ever inserted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE audits (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID,
///     username VARCHAR(255),
///     method TEXT NOT NULL,
///     url TEXT NOT NULL,
///     request_body JSONB,
///     status_code INTEGER NOT NULL,
///     ip_address VARCHAR(64),
///     correlation_id VARCHAR(128),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Placeholder stored instead of secret values
pub const REDACTED: &str = "[REDACTED]";

/// Keys whose values never reach the audit table (compared case-insensitively)
const SENSITIVE_KEYS: &[&str] = &["password", "refreshToken", "accessToken", "token"];

/// Stored audit row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub username: Option<String>,
    pub method: String,
    pub url: String,
    pub request_body: Option<JsonValue>,
    pub status_code: i32,
    pub ip_address: Option<String>,
    pub correlation_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for inserting an audit row
#[derive(Debug, Clone, Default)]
pub struct CreateAudit {
    pub user_id: Option<Uuid>,
    pub username: Option<String>,
    pub method: String,
    pub url: String,
    pub request_body: Option<JsonValue>,
    pub status_code: i32,
    pub ip_address: Option<String>,
    pub correlation_id: Option<String>,
}

/// Whether the request body is kept for this method
pub fn captures_body(method: &str) -> bool {
    matches!(method, "POST" | "PUT" | "PATCH")
}

/// Replaces sensitive values anywhere in a JSON document
pub fn redact(mut body: JsonValue) -> JsonValue {
    redact_in_place(&mut body);
    body
}

fn redact_in_place(value: &mut JsonValue) {
    match value {
        JsonValue::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if SENSITIVE_KEYS.iter().any(|k| key.eq_ignore_ascii_case(k)) {
                    *entry = JsonValue::String(REDACTED.to_string());
                } else {
                    redact_in_place(entry);
                }
            }
        }
        JsonValue::Array(items) => items.iter_mut().for_each(redact_in_place),
        _ => {}
    }
}

/// Builds the body snapshot for a request
///
/// Returns `None` for methods without a captured body, for empty bodies and
/// for bodies that are not JSON.
pub fn body_snapshot(method: &str, body: &[u8]) -> Option<JsonValue> {
    if !captures_body(method) || body.is_empty() {
        return None;
    }
    serde_json::from_slice::<JsonValue>(body).ok().map(redact)
}
