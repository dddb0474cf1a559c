/// Account registration and token lifecycle
///
/// Every successful register, login or refresh issues a new access/refresh
/// pair and stores it on the user row, replacing the previous pair. A refresh
/// token is only honoured while it is still the one stored on the row.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::ServiceError;
use crate::auth::jwt::{validate_refresh_token, TokenSettings};
use crate::auth::password::{hash_password, verify_password};
use crate::models::user::{CreateUser, Role, UpdateUser, User, UserProfile};
use crate::repository::UserStore;

/// Response body of register, login and refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub user_name: String,
    pub email: String,
    pub id: Uuid,
}

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_REFRESH: &str = "Invalid refresh token";

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenSettings,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenSettings) -> Self {
        Self { users, tokens }
    }

    /// Creates a `user`-role account and signs it in
    ///
    /// # Errors
    ///
    /// `Conflict` if the email is already registered, `BadRequest` if the
    /// password is too short.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthTokens, ServiceError> {
        if self.users.find_by_email(email).await?.is_some() {
            warn!(email, "Registration rejected: email already registered");
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_blocking(password.to_string()).await?;
        let user = self
            .users
            .insert(CreateUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role: Role::User,
            })
            .await?;

        info!(user_id = %user.id, "User registered");
        self.issue_tokens(&user).await
    }

    /// Verifies credentials and signs the user in
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, ServiceError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            warn!(email, "Login failed: unknown email");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_blocking(password.to_string(), user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        info!(user_id = %user.id, "User logged in");
        self.issue_tokens(&user).await
    }

    /// Exchanges the current refresh token for a new pair
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, ServiceError> {
        let claims = validate_refresh_token(refresh_token, &self.tokens.secret).map_err(|e| {
            warn!(error = %e, "Refresh rejected: token invalid");
            ServiceError::Unauthorized(INVALID_REFRESH.to_string())
        })?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized(INVALID_REFRESH.to_string()))?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            warn!(user_id = %user.id, "Refresh rejected: token superseded");
            return Err(ServiceError::Unauthorized(INVALID_REFRESH.to_string()));
        }

        info!(user_id = %user.id, "Tokens refreshed");
        self.issue_tokens(&user).await
    }

    /// Profile of the authenticated caller
    pub async fn me(&self, user_id: Uuid) -> Result<UserProfile, ServiceError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| ServiceError::Unauthorized("User not found".to_string()))
    }

    async fn issue_tokens(&self, user: &User) -> Result<AuthTokens, ServiceError> {
        let pair = self.tokens.issue_pair(user.id, &user.username, user.role)?;

        self.users
            .update(
                user.id,
                UpdateUser::tokens(pair.access_token.clone(), pair.refresh_token.clone()),
            )
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("User not found".to_string()))?;

        Ok(AuthTokens {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            user_name: user.username.clone(),
            email: user.email.clone(),
            id: user.id,
        })
    }
}

/// Argon2 is CPU-bound; keep it off the async workers
async fn hash_blocking(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServiceError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(ServiceError::from)
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, ServiceError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ServiceError::Internal(format!("Password verification task failed: {}", e)))?
        .map_err(ServiceError::from)
}
