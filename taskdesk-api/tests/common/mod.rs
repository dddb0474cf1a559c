//! Common test utilities for API tests
//!
//! This module provides shared infrastructure for the API tests:
//! - An app wired to fresh in-memory stores
//! - Registration/login helpers
//! - Request helpers returning status, headers and parsed JSON body

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use taskdesk_api::app::{build_router, AppState};
use taskdesk_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, LogFormat};
use taskdesk_shared::auth::password::hash_password;
use taskdesk_shared::models::user::{CreateUser, Role};
use taskdesk_shared::repository::memory::MemoryBackend;
use taskdesk_shared::repository::UserStore;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Response of one request
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Signed-in user
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub backend: MemoryBackend,
    pub app: Router,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["http://localhost:8080".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_ttl_seconds: 3600,
            refresh_ttl_seconds: 604800,
        },
        log_format: LogFormat::Pretty,
    }
}

impl TestContext {
    /// Creates a new test context over empty in-memory stores
    pub fn new() -> Self {
        let backend = MemoryBackend::new();
        let state = AppState::new(test_config(), backend.stores());
        let app = build_router(state);

        Self { backend, app }
    }

    /// Sends a request and parses the JSON body (`Value::Null` if empty)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.call(request).await
    }

    /// Sends a prebuilt request
    pub async fn call(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.send("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send("POST", uri, token, Some(body)).await
    }

    /// Registers a user through the API
    pub async fn register(&self, username: &str) -> TestUser {
        let email = format!("{username}@example.com");
        let response = self
            .post(
                "/auth/register",
                None,
                json!({"username": username, "email": email, "password": "secret1"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        user_from(&response.body["data"])
    }

    /// Seeds an admin directly in the store, then logs in through the API
    pub async fn admin(&self) -> TestUser {
        let hash = hash_password("secret1").unwrap();
        self.backend
            .stores()
            .users
            .insert(CreateUser {
                username: "root".to_string(),
                email: "root@example.com".to_string(),
                password_hash: hash,
                role: Role::Admin,
            })
            .await
            .unwrap();

        let response = self
            .post(
                "/auth/login",
                None,
                json!({"email": "root@example.com", "password": "secret1"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);

        user_from(&response.body["data"])
    }

    /// Creates a task through the API and returns its JSON
    pub async fn create_task(&self, user: &TestUser, title: &str) -> Value {
        let response = self
            .post(
                "/tasks",
                Some(&user.access_token),
                json!({"title": title, "dueDate": "2030-01-31"}),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        response.body["data"].clone()
    }
}

fn user_from(data: &Value) -> TestUser {
    TestUser {
        id: data["id"].as_str().unwrap().parse().unwrap(),
        email: data["email"].as_str().unwrap().to_string(),
        access_token: data["accessToken"].as_str().unwrap().to_string(),
        refresh_token: data["refreshToken"].as_str().unwrap().to_string(),
    }
}
