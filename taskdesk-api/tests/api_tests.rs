/// API tests for TaskDesk
///
/// These tests drive the real router (all middleware included) over
/// in-memory stores:
/// - Response envelope and error mapping
/// - Registration, login, refresh and profile
/// - Task CRUD with ownership checks and soft delete
/// - Listing with filters, search, sorting and paging
/// - Admin user directory
/// - Correlation ids and the audit trail

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use serde_json::json;
use taskdesk_shared::models::audit::REDACTED;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();
    let response = ctx.send("GET", "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["statusCode"], 200);
    assert_eq!(response.body["data"]["status"], "healthy");
    assert_eq!(response.body["data"]["database"], "connected");
}

#[tokio::test]
async fn test_unknown_route_uses_envelope() {
    let ctx = TestContext::new();
    let response = ctx.send("GET", "/nope", None, None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["statusCode"], 404);
    assert!(response.body["message"].is_string());
}

#[tokio::test]
async fn test_register_login_and_me() {
    let ctx = TestContext::new();

    let response = ctx
        .post(
            "/auth/register",
            None,
            json!({"username": "alice", "email": "alice@example.com", "password": "secret1"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["message"], "Resource created successfully");
    assert_eq!(response.body["statusCode"], 201);
    let data = &response.body["data"];
    assert_eq!(data["userName"], "alice");
    assert_eq!(data["email"], "alice@example.com");
    assert!(data["accessToken"].is_string());
    assert!(data["refreshToken"].is_string());

    let response = ctx
        .post(
            "/auth/login",
            None,
            json!({"email": "alice@example.com", "password": "secret1"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Login successful");
    let token = response.body["data"]["accessToken"].as_str().unwrap().to_string();

    let response = ctx.get("/auth/me", &token).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Resource retrieved successfully");
    let profile = &response.body["data"];
    assert_eq!(profile["username"], "alice");
    assert_eq!(profile["role"], "user");
    assert!(profile.get("passwordHash").is_none());
    assert!(profile.get("password_hash").is_none());
    assert!(profile.get("accessToken").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_is_conflict() {
    let ctx = TestContext::new();
    ctx.register("alice").await;

    let response = ctx
        .post(
            "/auth/register",
            None,
            json!({"username": "other", "email": "alice@example.com", "password": "secret2"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["statusCode"], 409);
    assert_eq!(response.body["message"], "Email already registered");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let ctx = TestContext::new();

    let response = ctx
        .post(
            "/auth/register",
            None,
            json!({"username": "bob", "email": "not-an-email", "password": "123"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["statusCode"], 422);

    let fields: Vec<&str> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password"]);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = TestContext::new();
    let request = Request::post("/auth/login")
        .header("content-type", "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();

    let response = ctx.call(request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["statusCode"], 400);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new();
    ctx.register("alice").await;

    let wrong_password = ctx
        .post(
            "/auth/login",
            None,
            json!({"email": "alice@example.com", "password": "wrong-password"}),
        )
        .await;
    let unknown_email = ctx
        .post(
            "/auth/login",
            None,
            json!({"email": "ghost@example.com", "password": "secret1"}),
        )
        .await;

    for response in [wrong_password, unknown_email] {
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["message"], "Invalid email or password");
    }
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;

    let response = ctx
        .post(
            "/auth/refresh",
            None,
            json!({"refreshToken": &alice.refresh_token}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Token refreshed successfully");
    let new_access = response.body["data"]["accessToken"].as_str().unwrap().to_string();
    assert_ne!(new_access, alice.access_token);

    // Superseded by the refresh above
    let response = ctx
        .post(
            "/auth/refresh",
            None,
            json!({"refreshToken": &alice.refresh_token}),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    assert_eq!(ctx.get("/auth/me", &new_access).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_require_bearer() {
    let ctx = TestContext::new();

    let response = ctx.send("GET", "/tasks", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["statusCode"], 401);

    let response = ctx.get("/tasks", "not-a-jwt").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // Refresh tokens are not accepted as bearer tokens
    let alice = ctx.register("alice").await;
    let response = ctx.get("/tasks", &alice.refresh_token).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_task_crud() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;

    let response = ctx
        .post(
            "/tasks",
            Some(&alice.access_token),
            json!({
                "title": "Write report",
                "description": "Quarterly numbers",
                "dueDate": "2030-01-31T12:00:00Z"
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["message"], "Resource created successfully");
    let task = &response.body["data"];
    assert_eq!(task["title"], "Write report");
    assert_eq!(task["status"], "TODO");
    assert_eq!(task["userId"], alice.id.to_string());
    assert!(task.get("deleted").is_none());
    let id = task["id"].as_str().unwrap().to_string();

    let response = ctx.get(&format!("/tasks/{id}"), &alice.access_token).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["description"], "Quarterly numbers");

    let response = ctx
        .send(
            "PUT",
            &format!("/tasks/{id}"),
            Some(&alice.access_token),
            Some(json!({"status": "INPROGRESS"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Resource updated successfully");
    assert_eq!(response.body["data"]["status"], "INPROGRESS");
    assert_eq!(response.body["data"]["title"], "Write report");

    let response = ctx
        .send("DELETE", &format!("/tasks/{id}"), Some(&alice.access_token), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Resource deleted successfully");
    assert!(response.body.get("data").is_none());

    let response = ctx.get(&format!("/tasks/{id}"), &alice.access_token).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = ctx.get("/tasks", &alice.access_token).await;
    assert_eq!(response.body["data"]["totalData"], 0);

    // Soft delete keeps the row
    assert_eq!(ctx.backend.tasks.all().len(), 1);
    assert!(ctx.backend.tasks.all()[0].deleted);
}

#[tokio::test]
async fn test_task_validation() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;

    let response = ctx
        .post(
            "/tasks",
            Some(&alice.access_token),
            json!({"title": "", "dueDate": "2030-01-31"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["data"][0]["field"], "title");

    let response = ctx
        .post(
            "/tasks",
            Some(&alice.access_token),
            json!({"title": "No date"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = ctx
        .post(
            "/tasks",
            Some(&alice.access_token),
            json!({"title": "Bad status", "status": "DONE", "dueDate": "2030-01-31"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = ctx.get("/tasks/not-a-uuid", &alice.access_token).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_other_users_tasks_are_forbidden() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;

    let task = ctx.create_task(&alice, "Alice only").await;
    let uri = format!("/tasks/{}", task["id"].as_str().unwrap());

    assert_eq!(ctx.get(&uri, &bob.access_token).await.status, StatusCode::FORBIDDEN);

    let response = ctx
        .send("PUT", &uri, Some(&bob.access_token), Some(json!({"title": "mine now"})))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["statusCode"], 403);

    let response = ctx.send("DELETE", &uri, Some(&bob.access_token), None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = ctx.get("/tasks", &bob.access_token).await;
    assert_eq!(response.body["data"]["totalData"], 0);

    // Still intact for the owner
    let response = ctx.get(&uri, &alice.access_token).await;
    assert_eq!(response.body["data"]["title"], "Alice only");
}

#[tokio::test]
async fn test_owner_cannot_be_reassigned() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;

    let task = ctx.create_task(&alice, "Mine").await;
    let uri = format!("/tasks/{}", task["id"].as_str().unwrap());

    let response = ctx
        .send(
            "PUT",
            &uri,
            Some(&alice.access_token),
            Some(json!({"title": "Still mine", "userId": bob.id})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["userId"], alice.id.to_string());
}

#[tokio::test]
async fn test_admin_sees_all_tasks() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;
    let admin = ctx.admin().await;

    let task = ctx.create_task(&alice, "Alice task").await;
    ctx.create_task(&bob, "Bob task").await;

    let response = ctx.get("/tasks", &admin.access_token).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["totalData"], 2);

    let uri = format!("/tasks/{}", task["id"].as_str().unwrap());
    assert_eq!(ctx.get(&uri, &admin.access_token).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_task_paging() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    for i in 0..15 {
        ctx.create_task(&alice, &format!("task {i:02}")).await;
    }

    let response = ctx.get("/tasks?page=2&limit=10", &alice.access_token).await;
    assert_eq!(response.status, StatusCode::OK);
    let page = &response.body["data"];
    assert_eq!(page["totalData"], 15);
    assert_eq!(page["totalPage"], 2);
    assert_eq!(page["currentPage"], 2);
    assert_eq!(page["perPage"], 10);
    assert_eq!(page["dataPaging"].as_array().unwrap().len(), 5);

    // Newest first by default
    let response = ctx.get("/tasks", &alice.access_token).await;
    let first = &response.body["data"]["dataPaging"][0];
    assert_eq!(first["title"], "task 14");
    assert_eq!(response.body["data"]["perPage"], 10);
}

#[tokio::test]
async fn test_task_filter_search_and_sort() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;

    ctx.create_task(&alice, "Buy milk").await;
    ctx.create_task(&alice, "Write REPORT").await;
    let done = ctx.create_task(&alice, "Annual report").await;
    ctx.send(
        "PUT",
        &format!("/tasks/{}", done["id"].as_str().unwrap()),
        Some(&alice.access_token),
        Some(json!({"status": "COMPLETED"})),
    )
    .await;

    let response = ctx.get("/tasks?status=COMPLETED", &alice.access_token).await;
    assert_eq!(response.body["data"]["totalData"], 1);
    assert_eq!(response.body["data"]["dataPaging"][0]["title"], "Annual report");

    let response = ctx.get("/tasks?search=report", &alice.access_token).await;
    assert_eq!(response.body["data"]["totalData"], 2);

    let response = ctx.get("/tasks?status=&search=", &alice.access_token).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["totalData"], 3);

    let response = ctx
        .get("/tasks?sortBy=title&sortDirection=asc", &alice.access_token)
        .await;
    let titles: Vec<&str> = response.body["data"]["dataPaging"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Annual report", "Buy milk", "Write REPORT"]);

    let response = ctx
        .get("/tasks?sortBy=title&sortDirection=DESC", &alice.access_token)
        .await;
    assert_eq!(response.body["data"]["dataPaging"][0]["title"], "Write REPORT");
}

#[tokio::test]
async fn test_task_list_rejects_bad_query() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;

    let response = ctx.get("/tasks?sortBy=password", &alice.access_token).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = ctx
        .get("/tasks?sortBy=title&sortDirection=sideways", &alice.access_token)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = ctx.get("/tasks?status=DONE", &alice.access_token).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = ctx.get("/tasks?limit=500", &alice.access_token).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = ctx.get("/tasks?page=0", &alice.access_token).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_user_directory() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;
    let admin = ctx.admin().await;

    let response = ctx.get("/users", &alice.access_token).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message"], "Admin role required");

    let response = ctx.get("/users?limit=2", &admin.access_token).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["totalData"], 3);
    assert_eq!(response.body["data"]["totalPage"], 2);

    let own = format!("/users/{}", alice.id);
    let response = ctx.get(&own, &alice.access_token).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["email"], alice.email);

    assert_eq!(ctx.get(&own, &bob.access_token).await.status, StatusCode::FORBIDDEN);
    assert_eq!(ctx.get(&own, &admin.access_token).await.status, StatusCode::OK);

    let response = ctx.get("/users/all", &alice.access_token).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = ctx.get("/users/all", &admin.access_token).await;
    assert_eq!(response.status, StatusCode::OK);
    let emails: Vec<_> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(emails, [alice.email, bob.email, admin.email]);
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let ctx = TestContext::new();

    let request = Request::get("/health")
        .header("x-correlation-id", "trace-me-42")
        .body(Body::empty())
        .unwrap();
    let response = ctx.call(request).await;
    assert_eq!(
        response.headers.get("x-correlation-id").unwrap(),
        "trace-me-42"
    );

    let response = ctx.send("GET", "/health", None, None).await;
    let generated = response.headers.get("x-correlation-id").unwrap();
    assert!(uuid::Uuid::parse_str(generated.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_requests_are_audited() {
    let ctx = TestContext::new();

    let request = Request::post("/auth/register")
        .header("content-type", "application/json")
        .header("x-correlation-id", "audit-1")
        .body(Body::from(
            json!({"username": "alice", "email": "alice@example.com", "password": "secret1"})
                .to_string(),
        ))
        .unwrap();
    let response = ctx.call(request).await;
    assert_eq!(response.status, StatusCode::CREATED);
    let token = response.body["data"]["accessToken"].as_str().unwrap().to_string();

    let records = ctx.backend.audits.records();
    assert_eq!(records.len(), 1);
    let register = &records[0];
    assert_eq!(register.method, "POST");
    assert_eq!(register.url, "/auth/register");
    assert_eq!(register.status_code, 201);
    assert_eq!(register.correlation_id.as_deref(), Some("audit-1"));
    assert!(register.user_id.is_none());
    let body = register.request_body.as_ref().unwrap();
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["password"], REDACTED);

    // Authenticated reads record the caller but no body
    ctx.get("/tasks?page=1", &token).await;
    let records = ctx.backend.audits.records();
    assert_eq!(records.len(), 2);
    let list = &records[1];
    assert_eq!(list.method, "GET");
    assert_eq!(list.url, "/tasks?page=1");
    assert_eq!(list.status_code, 200);
    assert_eq!(list.username.as_deref(), Some("alice"));
    assert!(list.user_id.is_some());
    assert!(list.request_body.is_none());

    // Failed requests are audited too
    ctx.get("/tasks", "garbage").await;
    let records = ctx.backend.audits.records();
    assert_eq!(records.last().unwrap().status_code, 401);
}

#[tokio::test]
async fn test_refresh_token_is_redacted_in_audit() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;

    let response = ctx
        .post(
            "/auth/refresh",
            None,
            json!({"refreshToken": &alice.refresh_token}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let records = ctx.backend.audits.records();
    let refresh = records.last().unwrap();
    assert_eq!(refresh.url, "/auth/refresh");
    let body = refresh.request_body.as_ref().unwrap();
    assert_eq!(body["refreshToken"], REDACTED);
    assert!(!body.to_string().contains(&alice.refresh_token));
}

#[tokio::test]
async fn test_oversized_body_is_rejected_and_audited() {
    let ctx = TestContext::new();

    let padding = "x".repeat(3 * 1024 * 1024);
    let request = Request::post("/auth/login")
        .header("content-type", "application/json")
        .header("x-correlation-id", "too-big")
        .body(Body::from(
            json!({"email": "a@example.com", "password": padding}).to_string(),
        ))
        .unwrap();
    let response = ctx.call(request).await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.body["statusCode"], 413);

    let records = ctx.backend.audits.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status_code, 413);
    assert_eq!(records[0].url, "/auth/login");
    assert_eq!(records[0].correlation_id.as_deref(), Some("too-big"));
    assert!(records[0].request_body.is_none());
}
