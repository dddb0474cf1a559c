/// User directory endpoints
///
/// - `GET /users?page&limit` - Page through users (admin only)
/// - `GET /users/all` - Every user, unpaged (admin only)
/// - `GET /users/:id` - One user's profile (admin, or the user themself)

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiPath, ValidatedQuery},
    response::ApiResponse,
};
use axum::extract::State;
use serde::Deserialize;
use taskdesk_shared::auth::middleware::AuthContext;
use taskdesk_shared::models::user::UserProfile;
use taskdesk_shared::repository::{Page, PageRequest};
use uuid::Uuid;
use validator::Validate;

/// Paging parameters of `GET /users`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserListQuery {
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,

    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<u32>,
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedQuery(query): ValidatedQuery<UserListQuery>,
) -> ApiResult<ApiResponse<Page<UserProfile>>> {
    let page = PageRequest::new(query.page, query.limit)?;
    let users = state.services.users.list(&auth, page).await?;
    Ok(ApiResponse::retrieved(users))
}

pub async fn list_all(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<ApiResponse<Vec<UserProfile>>> {
    let users = state.services.users.list_all(&auth).await?;
    Ok(ApiResponse::retrieved(users))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<UserProfile>> {
    let user = state.services.users.get(&auth, id).await?;
    Ok(ApiResponse::retrieved(user))
}
