/// Authentication endpoints
///
/// This module provides user authentication endpoints:
/// - Registration
/// - Login
/// - Token refresh
/// - Current user profile
///
/// # Endpoints
///
/// - `POST /auth/register` - Register new user
/// - `POST /auth/login` - Login and get tokens
/// - `POST /auth/refresh` - Exchange a refresh token for a new pair
/// - `GET /auth/me` - Profile of the bearer

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ValidatedJson,
    response::ApiResponse,
};
use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use taskdesk_shared::auth::middleware::AuthContext;
use taskdesk_shared::models::user::UserProfile;
use taskdesk_shared::services::AuthTokens;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Username must be 1-100 characters"))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "secret1"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "message": "Resource created successfully",
///   "statusCode": 201,
///   "data": {
///     "accessToken": "eyJ...",
///     "refreshToken": "eyJ...",
///     "userName": "alice",
///     "email": "alice@example.com",
///     "id": "uuid"
///   }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed JSON
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<ApiResponse<AuthTokens>> {
    let tokens = state
        .services
        .auth
        .register(&req.username, &req.email, &req.password)
        .await?;

    Ok(ApiResponse::created(tokens))
}

/// Login with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password (same message for both)
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<ApiResponse<AuthTokens>> {
    let tokens = state.services.auth.login(&req.email, &req.password).await?;
    Ok(ApiResponse::with_message(StatusCode::OK, "Login successful", tokens))
}

/// Exchange the current refresh token for a new token pair
///
/// The previous pair stops working for refresh once a new one is issued.
///
/// # Errors
///
/// - `401 Unauthorized`: Token invalid, expired, or no longer current
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> ApiResult<ApiResponse<AuthTokens>> {
    let tokens = state.services.auth.refresh(&req.refresh_token).await?;
    Ok(ApiResponse::with_message(
        StatusCode::OK,
        "Token refreshed successfully",
        tokens,
    ))
}

/// Profile of the authenticated user
pub async fn me(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<ApiResponse<UserProfile>> {
    let profile = state.services.auth.me(auth.user_id).await?;
    Ok(ApiResponse::retrieved(profile))
}
