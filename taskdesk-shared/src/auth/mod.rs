/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: access/refresh token issuing and validation
/// - [`middleware`]: bearer-token middleware and the `AuthContext` extractor
/// - [`authorization`]: owner/admin checks
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::jwt::{validate_access_token, TokenSettings};
/// use taskdesk_shared::auth::password::{hash_password, verify_password};
/// use taskdesk_shared::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let settings = TokenSettings::new("a-very-long-secret-for-doc-examples-only");
/// let pair = settings.issue_pair(Uuid::new_v4(), "alice", Role::User)?;
/// validate_access_token(&pair.access_token, &settings.secret)?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
