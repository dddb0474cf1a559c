/// User directory
///
/// Admins can list every account; anyone can look up themself.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::ServiceError;
use crate::auth::authorization::{require_admin, AuthzError};
use crate::auth::middleware::AuthContext;
use crate::models::user::UserProfile;
use crate::repository::{Filter, Page, PageRequest, Sort, SortDirection, UserStore};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Pages through all live users, newest first (admin only)
    pub async fn list(
        &self,
        auth: &AuthContext,
        page: PageRequest,
    ) -> Result<Page<UserProfile>, ServiceError> {
        require_admin(auth)?;
        debug!(
            admin_id = %auth.user_id,
            page = page.page,
            limit = page.limit,
            "Listing users"
        );

        let users = self
            .users
            .get_paging(Filter::new(), page, Sort::default())
            .await?;
        Ok(users.map(UserProfile::from))
    }

    /// Every live user, oldest first (admin only)
    pub async fn list_all(&self, auth: &AuthContext) -> Result<Vec<UserProfile>, ServiceError> {
        require_admin(auth)?;

        let users = self
            .users
            .queries(Filter::new(), Sort::new("created_at", SortDirection::Asc))
            .await?;
        debug!(admin_id = %auth.user_id, count = users.len(), "Fetched all users");

        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    /// Looks up one user (admin, or the user themself)
    pub async fn get(&self, auth: &AuthContext, id: Uuid) -> Result<UserProfile, ServiceError> {
        if !auth.is_admin() && auth.user_id != id {
            warn!(caller_id = %auth.user_id, user_id = %id, "User lookup denied");
            return Err(AuthzError::NotAuthorized.into());
        }

        debug!(caller_id = %auth.user_id, user_id = %id, "Fetching user");
        self.users
            .find_by_id(id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }
}
