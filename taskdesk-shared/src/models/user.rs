/// User model
///
/// A user owns tasks and authenticates with email + password. The most
/// recently issued access and refresh tokens are persisted on the row so a
/// refresh request can be checked against the last token handed out.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
///     refresh_token TEXT,
///     access_token TEXT,
///     deleted BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT users_email_key UNIQUE (email)
/// );
/// ```
///
/// # Example
///
/// ```
/// use taskdesk_shared::models::user::Role;
///
/// let role: Role = "admin".parse().unwrap();
/// assert!(role.is_admin());
/// assert_eq!(Role::default(), Role::User);
/// ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repository::{Entity, FieldValue};

/// Error returned when a stored or supplied role string is unknown
#[derive(Debug, thiserror::Error)]
#[error("Invalid role: {0}")]
pub struct InvalidRole(pub String);

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sees and modifies only their own tasks
    #[default]
    User,

    /// Sees and modifies every task, can list users
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(InvalidRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = InvalidRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// User row
///
/// Not serializable on purpose: responses go through [`UserProfile`], which
/// never carries the password hash or stored tokens.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    pub username: String,

    /// Unique across all users, including soft-deleted ones
    pub email: String,

    /// Argon2id PHC string
    pub password_hash: String,

    #[sqlx(try_from = "String")]
    pub role: Role,

    /// Last refresh token issued (None before the first login)
    pub refresh_token: Option<String>,

    /// Last access token issued
    pub access_token: Option<String>,

    pub deleted: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,

    /// Argon2id hash (NOT the plaintext password)
    pub password_hash: String,

    pub role: Role,
}

/// Partial update for a user
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
}

impl UpdateUser {
    /// Update that stores a freshly issued token pair
    pub fn tokens(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            ..Default::default()
        }
    }

    /// Applies the update to an in-memory copy of the row
    pub fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(password_hash) = self.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(refresh_token) = self.refresh_token {
            user.refresh_token = Some(refresh_token);
        }
        if let Some(access_token) = self.access_token {
            user.access_token = Some(access_token);
        }
    }
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str = "id, username, email, password_hash, role, refresh_token, \
        access_token, deleted, created_at, updated_at";

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.updated_at = at;
    }

    fn field(&self, column: &str) -> Option<FieldValue> {
        let value: FieldValue = match column {
            "id" => self.id.into(),
            "username" => self.username.as_str().into(),
            "email" => self.email.as_str().into(),
            "role" => self.role.as_str().into(),
            "deleted" => self.deleted.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        };
        Some(value)
    }

    fn sort_column(field: &str) -> Option<&'static str> {
        match field {
            "username" => Some("username"),
            "email" => Some("email"),
            "createdAt" | "created_at" => Some("created_at"),
            _ => None,
        }
    }
}
