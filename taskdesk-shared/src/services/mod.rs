/// Business logic
///
/// Services sit between the HTTP handlers and the stores. They own every
/// access decision (ownership, admin-only operations) so the handlers stay
/// thin, and they work identically over the PostgreSQL and in-memory
/// backends.
///
/// - [`auth`]: registration, login, token refresh and the caller's profile
/// - [`tasks`]: task CRUD with owner/admin visibility
/// - [`users`]: user listing and lookup

pub mod auth;
pub mod tasks;
pub mod users;

use crate::auth::authorization::AuthzError;
use crate::auth::jwt::{JwtError, TokenSettings};
use crate::auth::password::PasswordError;
use crate::repository::{RepositoryError, Stores};

pub use auth::{AuthService, AuthTokens};
pub use tasks::TaskService;
pub use users::UserService;

/// Error type for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => ServiceError::Database(e),
            RepositoryError::Conflict(msg) => ServiceError::Conflict(msg),
            RepositoryError::InvalidQuery(msg) => ServiceError::BadRequest(msg),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        ServiceError::Forbidden(err.to_string())
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort => ServiceError::BadRequest(err.to_string()),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

/// All services, built over one set of stores
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub tasks: TaskService,
    pub users: UserService,
}

impl Services {
    pub fn new(stores: &Stores, tokens: TokenSettings) -> Self {
        Self {
            auth: AuthService::new(stores.users.clone(), tokens),
            tasks: TaskService::new(stores.tasks.clone()),
            users: UserService::new(stores.users.clone()),
        }
    }
}
