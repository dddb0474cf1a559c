/// Response envelope
///
/// Every body the API returns, success or error, has the shape
///
/// ```json
/// { "message": "...", "statusCode": 200, "data": ... }
/// ```
///
/// `data` is left out when there is nothing to return.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

pub const CREATED: &str = "Resource created successfully";
pub const RETRIEVED: &str = "Resource retrieved successfully";
pub const UPDATED: &str = "Resource updated successfully";
pub const DELETED: &str = "Resource deleted successfully";

/// Serialized envelope body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub message: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// A successful response wrapped in the envelope
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    status: StatusCode,
    message: String,
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 201 with the default creation message
    pub fn created(data: T) -> Self {
        Self::with_message(StatusCode::CREATED, CREATED, data)
    }

    /// 200 with the default read message
    pub fn retrieved(data: T) -> Self {
        Self::with_message(StatusCode::OK, RETRIEVED, data)
    }

    /// 200 with the default update message
    pub fn updated(data: T) -> Self {
        Self::with_message(StatusCode::OK, UPDATED, data)
    }

    pub fn with_message(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl ApiResponse<()> {
    /// 200 without data, for deletes
    pub fn deleted() -> Self {
        Self {
            status: StatusCode::OK,
            message: DELETED.to_string(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            message: self.message,
            status_code: self.status.as_u16(),
            data: self.data,
        };
        (self.status, Json(body)).into_response()
    }
}
