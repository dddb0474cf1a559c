/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskdesk_api::{app::AppState, config::Config};
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskdesk_shared::repository::Stores;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
/// let state = AppState::new(config, Stores::postgres(pool));
/// let app = taskdesk_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{
        audit::audit_middleware,
        correlation::{correlation_middleware, CORRELATION_HEADER},
    },
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use taskdesk_shared::auth::middleware::jwt_auth_middleware;
use taskdesk_shared::repository::{AuditStore, HealthCheck, Stores};
use taskdesk_shared::services::Services;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is reference-counted, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,

    /// Business logic
    pub services: Services,

    /// Audit trail sink
    pub audits: Arc<dyn AuditStore>,

    /// Backend liveness probe
    pub health: Arc<dyn HealthCheck>,
}

impl AppState {
    /// Creates new application state over the given stores
    pub fn new(config: Config, stores: Stores) -> Self {
        let services = Services::new(&stores, config.token_settings());
        Self {
            config: Arc::new(config),
            services,
            audits: stores.audits,
            health: stores.health,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health              # Health check (public)
/// ├── /auth/
/// │   ├── POST /register        # public
/// │   ├── POST /login           # public
/// │   ├── POST /refresh         # public
/// │   └── GET  /me              # bearer
/// ├── /tasks                    # bearer
/// │   ├── POST   /
/// │   ├── GET    /
/// │   ├── GET    /:id
/// │   ├── PUT    /:id
/// │   └── DELETE /:id
/// └── /users                    # bearer
///     ├── GET /                 # admin only
///     └── GET /:id              # self or admin
/// ```
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Correlation id and request span
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Audit trail
/// 5. Panic recovery (tower-http CatchPanicLayer)
/// 6. Authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh));

    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route("/tasks", post(routes::tasks::create).get(routes::tasks::list))
        .route(
            "/tasks/:id",
            get(routes::tasks::get)
                .put(routes::tasks::update)
                .delete(routes::tasks::delete),
        )
        .route("/users", get(routes::users::list))
        .route("/users/all", get(routes::users::list_all))
        .route("/users/:id", get(routes::users::get))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn_with_state(state.audits.clone(), audit_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(from_fn(correlation_middleware))
        .with_state(state)
}

/// Configure CORS based on environment
fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allows_any() {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, CORRELATION_HEADER])
        .expose_headers([CORRELATION_HEADER])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Validates the bearer token and injects `AuthContext` into the request
/// (and the response, for the audit layer).
async fn jwt_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    jwt_auth_middleware(state.jwt_secret(), req, next)
        .await
        .map_err(ApiError::from)
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Renders a panic as a 500 envelope
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    ApiError::InternalError(format!("Handler panicked: {}", detail)).into_response()
}
