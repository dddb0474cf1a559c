/// Configuration management for the API server
///
/// This module loads configuration from environment variables (and a `.env`
/// file, if present) into a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 3000)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any
///   (default: http://localhost:8080)
/// - `PRODUCTION`: `true` in production deployments (default: false).
///   Production rejects `CORS_ORIGINS=*` and defaults `LOG_FORMAT` to json.
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing (required, at least 32 chars)
/// - `JWT_ACCESS_TTL_SECONDS`: Access token lifetime (default: 3600)
/// - `JWT_REFRESH_TTL_SECONDS`: Refresh token lifetime (default: 604800)
/// - `LOG_FORMAT`: `pretty` or `json` (default: pretty, json in production)
///
/// # Example
///
/// ```no_run
/// use taskdesk_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use taskdesk_shared::auth::jwt::TokenSettings;

/// Shortest accepted `JWT_SECRET`
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Log output format
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins (`*` allows any)
    pub cors_origins: Vec<String>,

    /// Running in production
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Access token lifetime in seconds
    pub access_ttl_seconds: i64,

    /// Refresh token lifetime in seconds
    pub refresh_ttl_seconds: i64,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` or `JWT_SECRET` is missing
    /// - [`Config::validate`] rejects the result
    /// - A numeric or boolean variable cannot be parsed
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env_or("API_PORT", "3000").parse::<u16>()?;
        let cors_origins = parse_origins(&env_or("CORS_ORIGINS", "http://localhost:8080"));
        let production = env_or("PRODUCTION", "false").parse::<bool>()?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env_or("DATABASE_MAX_CONNECTIONS", "10").parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        let access_ttl_seconds = env_or("JWT_ACCESS_TTL_SECONDS", "3600").parse::<i64>()?;
        let refresh_ttl_seconds = env_or("JWT_REFRESH_TTL_SECONDS", "604800").parse::<i64>()?;

        let default_log_format = if production { "json" } else { "pretty" };
        let log_format = env_or("LOG_FORMAT", default_log_format).parse::<LogFormat>()?;

        let config = Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                access_ttl_seconds,
                refresh_ttl_seconds,
            },
            log_format,
        };
        config.validate()?;

        Ok(config)
    }

    /// Checks the values that parsing alone cannot
    ///
    /// The JWT secret must be at least 32 characters, token lifetimes must be
    /// positive, and production deployments may not allow any CORS origin.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }
        if self.jwt.access_ttl_seconds <= 0 || self.jwt.refresh_ttl_seconds <= 0 {
            anyhow::bail!("JWT token lifetimes must be positive");
        }
        if self.api.production && self.cors_allows_any() {
            anyhow::bail!("CORS_ORIGINS=* is not allowed when PRODUCTION=true");
        }
        Ok(())
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Token signing settings derived from the JWT section
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings::new(self.jwt.secret.clone()).with_ttls(
            Duration::seconds(self.jwt.access_ttl_seconds),
            Duration::seconds(self.jwt.refresh_ttl_seconds),
        )
    }

    /// Whether CORS should accept any origin
    pub fn cors_allows_any(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o == "*")
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
