/// Task operations
///
/// Visibility rule: a `user` only ever sees their own tasks; an `admin` sees
/// all of them. Listing enforces this by injecting a `user_id` condition for
/// non-admins. Single-task operations load the task first and then run the
/// owner-or-admin check, so a missing task is `NotFound` and somebody else's
/// task is `Forbidden`.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::ServiceError;
use crate::auth::authorization::require_owner_or_admin;
use crate::auth::middleware::AuthContext;
use crate::models::task::{CreateTaskRequest, Task, TaskQuery, UpdateTask};
use crate::repository::{Filter, Page, PageRequest, Sort, SortDirection, TaskStore};

#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>) -> Self {
        Self { tasks }
    }

    /// Creates a task owned by the caller
    pub async fn create(
        &self,
        auth: &AuthContext,
        request: CreateTaskRequest,
    ) -> Result<Task, ServiceError> {
        let task = self.tasks.insert(request.into_create(auth.user_id)).await?;
        info!(task_id = %task.id, user_id = %auth.user_id, "Task created");
        Ok(task)
    }

    /// Lists visible tasks with filtering, search, sorting and paging
    pub async fn list(
        &self,
        auth: &AuthContext,
        query: TaskQuery,
    ) -> Result<Page<Task>, ServiceError> {
        let filter = Self::build_filter(auth, &query);
        let sort = Self::build_sort(&query)?;
        let page = PageRequest::new(query.page, query.limit)?;

        debug!(
            user_id = %auth.user_id,
            conditions = filter.conditions().len(),
            sort_column = sort.column,
            page = page.page,
            limit = page.limit,
            "Listing tasks"
        );

        Ok(self.tasks.get_paging(filter, page, sort).await?)
    }

    /// Loads a task the caller may see
    pub async fn get(&self, auth: &AuthContext, id: Uuid) -> Result<Task, ServiceError> {
        let task = self
            .tasks
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Task not found".to_string()))?;

        require_owner_or_admin(auth, task.user_id)?;
        Ok(task)
    }

    /// Applies a partial update after the ownership check
    pub async fn update(
        &self,
        auth: &AuthContext,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Task, ServiceError> {
        let current = self.get(auth, id).await?;
        if data.is_empty() {
            return Ok(current);
        }

        let task = self
            .tasks
            .update(id, data)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Task not found".to_string()))?;

        info!(task_id = %id, user_id = %auth.user_id, "Task updated");
        Ok(task)
    }

    /// Soft-deletes a task after the ownership check
    pub async fn delete(&self, auth: &AuthContext, id: Uuid) -> Result<(), ServiceError> {
        self.get(auth, id).await?;

        if !self.tasks.soft_delete(id).await? {
            return Err(ServiceError::NotFound("Task not found".to_string()));
        }

        info!(task_id = %id, user_id = %auth.user_id, "Task deleted");
        Ok(())
    }

    fn build_filter(auth: &AuthContext, query: &TaskQuery) -> Filter {
        let mut filter = Filter::new();

        if !auth.is_admin() {
            filter = filter.eq("user_id", auth.user_id);
        }
        if let Some(status) = query.status {
            filter = filter.eq("status", status.as_str());
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            filter = filter.ilike("title", search);
        }

        filter
    }

    /// `sortBy` must name a whitelisted field; direction defaults to ASC
    /// when a field is given. Without `sortBy` the newest tasks come first.
    fn build_sort(query: &TaskQuery) -> Result<Sort, ServiceError> {
        let Some(field) = query.sort_by.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(Sort::default());
        };

        let direction = match query.sort_direction.as_deref() {
            Some(raw) if !raw.is_empty() => raw.parse::<SortDirection>()?,
            _ => SortDirection::Asc,
        };

        Ok(Sort::for_field::<Task>(field, direction)?)
    }
}
