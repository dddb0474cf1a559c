/// Authorization checks
///
/// TaskDesk has two roles:
///
/// 1. **user**: may read and modify only resources they own
/// 2. **admin**: may read and modify every resource, and list users
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::authorization::{can_access, require_owner_or_admin};
/// use taskdesk_shared::auth::middleware::AuthContext;
/// use taskdesk_shared::models::user::Role;
/// use uuid::Uuid;
///
/// let alice = AuthContext::new(Uuid::new_v4(), "alice", Role::User);
/// let admin = AuthContext::new(Uuid::new_v4(), "root", Role::Admin);
///
/// assert!(can_access(&alice, alice.user_id));
/// assert!(can_access(&admin, alice.user_id));
/// assert!(require_owner_or_admin(&alice, admin.user_id).is_err());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("Not authorized to access this resource")]
    NotAuthorized,

    #[error("Admin role required")]
    AdminRequired,
}

/// Owner or admin
pub fn can_access(auth: &AuthContext, owner_id: Uuid) -> bool {
    auth.is_admin() || auth.user_id == owner_id
}

pub fn require_owner_or_admin(auth: &AuthContext, owner_id: Uuid) -> Result<(), AuthzError> {
    if !can_access(auth, owner_id) {
        tracing::warn!(
            user_id = %auth.user_id,
            owner_id = %owner_id,
            "Denied access to another user's resource"
        );
        return Err(AuthzError::NotAuthorized);
    }
    Ok(())
}

pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if !auth.is_admin() {
        return Err(AuthzError::AdminRequired);
    }
    Ok(())
}
