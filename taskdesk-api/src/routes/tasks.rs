/// Task endpoints
///
/// All routes require a bearer token. Regular users only ever see and touch
/// their own tasks; admins see everyone's.
///
/// # Endpoints
///
/// - `POST /tasks` - Create a task owned by the caller
/// - `GET /tasks` - Page through visible tasks
///   (`status`, `search`, `sortBy`, `sortDirection`, `limit`, `page`)
/// - `GET /tasks/:id` - Fetch one task
/// - `PUT /tasks/:id` - Partial update
/// - `DELETE /tasks/:id` - Soft delete

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiPath, ValidatedJson, ValidatedQuery},
    response::ApiResponse,
};
use axum::extract::State;
use taskdesk_shared::auth::middleware::AuthContext;
use taskdesk_shared::models::task::{CreateTaskRequest, Task, TaskQuery, UpdateTask};
use taskdesk_shared::repository::Page;
use uuid::Uuid;

/// Create a task
///
/// ```text
/// POST /tasks
/// Authorization: Bearer <access token>
///
/// { "title": "Write report", "description": "Q3", "status": "TODO", "dueDate": "2025-01-31" }
/// ```
pub async fn create(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<ApiResponse<Task>> {
    let task = state.services.tasks.create(&auth, req).await?;
    Ok(ApiResponse::created(task))
}

/// List tasks
///
/// # Errors
///
/// - `400 Bad Request`: Unknown `status`, `sortBy` or `sortDirection`
/// - `422 Unprocessable Entity`: `page` or `limit` out of range
pub async fn list(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedQuery(query): ValidatedQuery<TaskQuery>,
) -> ApiResult<ApiResponse<Page<Task>>> {
    let page = state.services.tasks.list(&auth, query).await?;
    Ok(ApiResponse::retrieved(page))
}

/// Get a task
///
/// `404` if it does not exist (or was deleted), `403` if it belongs to
/// someone else.
pub async fn get(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Task>> {
    let task = state.services.tasks.get(&auth, id).await?;
    Ok(ApiResponse::retrieved(task))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateTask>,
) -> ApiResult<ApiResponse<Task>> {
    let task = state.services.tasks.update(&auth, id, req).await?;
    Ok(ApiResponse::updated(task))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    state.services.tasks.delete(&auth, id).await?;
    Ok(ApiResponse::deleted())
}
