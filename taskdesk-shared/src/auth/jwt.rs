/// JWT token generation and validation
///
/// Tokens are HS256-signed and carry the user's id, username and role so
/// that authenticated requests never need a database round trip.
///
/// # Token Types
///
/// - **Access Token**: short-lived (default 1 hour), sent as `Authorization: Bearer`
/// - **Refresh Token**: long-lived (default 7 days), exchanged at `/auth/refresh`
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::jwt::{validate_access_token, TokenSettings};
/// use taskdesk_shared::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = TokenSettings::new("a-very-long-secret-for-doc-examples-only");
/// let user_id = Uuid::new_v4();
///
/// let pair = settings.issue_pair(user_id, "alice", Role::User)?;
/// let claims = validate_access_token(&pair.access_token, &settings.secret)?;
/// assert_eq!(claims.sub, user_id);
/// assert_eq!(claims.username, "alice");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Role;

/// Value of the `iss` claim
pub const ISSUER: &str = "taskdesk";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid issuer")]
    InvalidIssuer,

    #[error("Expected {expected} token")]
    WrongType { expected: &'static str },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims
///
/// Standard claims (`sub`, `iss`, `iat`, `nbf`, `exp`) plus the caller's
/// username and role. `jti` makes every issued token distinct, even two
/// issued within the same second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,

    pub username: String,

    pub role: Role,

    pub token_type: TokenType,

    /// Always [`ISSUER`]
    pub iss: String,

    pub iat: i64,

    pub nbf: i64,

    pub exp: i64,

    pub jti: Uuid,
}

impl Claims {
    /// Builds claims valid from now for `ttl`
    pub fn new(
        user_id: Uuid,
        username: impl Into<String>,
        role: Role,
        token_type: TokenType,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            username: username.into(),
            role,
            token_type,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4(),
        }
    }
}

/// Signing secret and token lifetimes
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// A freshly issued access/refresh token pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenSettings {
    pub const DEFAULT_ACCESS_TTL_SECONDS: i64 = 3600;
    pub const DEFAULT_REFRESH_TTL_SECONDS: i64 = 7 * 24 * 3600;

    /// Settings with the default lifetimes (1 hour / 7 days)
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::seconds(Self::DEFAULT_ACCESS_TTL_SECONDS),
            refresh_ttl: Duration::seconds(Self::DEFAULT_REFRESH_TTL_SECONDS),
        }
    }

    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    /// Signs an access token and a refresh token for the same user
    pub fn issue_pair(
        &self,
        user_id: Uuid,
        username: &str,
        role: Role,
    ) -> Result<TokenPair, JwtError> {
        let access = Claims::new(user_id, username, role, TokenType::Access, self.access_ttl);
        let refresh = Claims::new(user_id, username, role, TokenType::Refresh, self.refresh_ttl);

        Ok(TokenPair {
            access_token: create_token(&access, &self.secret)?,
            refresh_token: create_token(&refresh, &self.secret)?,
        })
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Verifies signature, issuer, `exp` and `nbf`, then returns the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => JwtError::Expired,
        ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(e.to_string()),
    })?;

    Ok(data.claims)
}

/// [`validate_token`] plus a check that the token is an access token
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;
    if claims.token_type != TokenType::Access {
        return Err(JwtError::WrongType { expected: "access" });
    }
    Ok(claims)
}

/// [`validate_token`] plus a check that the token is a refresh token
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;
    if claims.token_type != TokenType::Refresh {
        return Err(JwtError::WrongType { expected: "refresh" });
    }
    Ok(claims)
}
