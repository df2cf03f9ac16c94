use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tasklane_api::{build_router, AppState};
use tasklane_config::AppConfig;
use tasklane_runtime::BackendServices;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    _db_dir: TempDir,
}

struct TestResponse {
    status: StatusCode,
    json: Value,
}

impl TestApp {
    async fn new() -> Self {
        let db_dir = TempDir::new().expect("create temp dir");
        let db_path = db_dir.path().join("tasklane-test.db");

        let mut config = AppConfig::default();
        config.database.url = format!("sqlite://{}", db_path.to_string_lossy());
        config.database.max_connections = 5;
        config.auth.token_secret = "api-test-secret".to_string();

        let services = BackendServices::initialise(&config)
            .await
            .expect("initialise backend services");

        let state = AppState::new(services.authenticator.clone(), services.tasks.clone());
        let router = build_router(state, &config.http);

        Self {
            router,
            _db_dir: db_dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("dispatch request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect response body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, json }
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = if let Some(json_body) = body {
            let bytes = serde_json::to_vec(&json_body).expect("serialize request body");
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(bytes)
        } else {
            Body::empty()
        };

        self.send(builder.body(body).expect("build request")).await
    }

    async fn register_and_login(&self, email: &str) -> String {
        let credentials = json!({ "email": email, "password": "p@ssw0rd" });

        let registered = self
            .request(Method::POST, "/api/auth/register", Some(credentials.clone()), None)
            .await;
        assert_eq!(registered.status, StatusCode::CREATED);

        let login = self
            .request(Method::POST, "/api/auth/login", Some(credentials), None)
            .await;
        assert_eq!(login.status, StatusCode::OK);

        login.json["token"]
            .as_str()
            .expect("login returns a token")
            .to_string()
    }
}

#[tokio::test]
async fn health_check_reports_ok() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["status"], "ok");
    assert!(response.json["timestamp"].is_string());
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.json["paths"]["/api/tasks"].is_object());
    assert!(response.json["paths"]["/api/tasks/{task_id}"].is_object());
}

#[tokio::test]
async fn end_to_end_task_lifecycle() {
    let app = TestApp::new().await;
    let token = app.register_and_login("a@x.io").await;

    let created = app
        .request(
            Method::POST,
            "/api/tasks",
            Some(json!({ "title": "T" })),
            Some(&token),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json["title"], "T");
    assert_eq!(created.json["status"], "pending");
    assert_eq!(created.json["priority"], "medium");
    let task_id = created.json["id"].as_str().expect("task id").to_string();

    let updated = app
        .request(
            Method::PUT,
            &format!("/api/tasks/{task_id}"),
            Some(json!({ "status": "completed" })),
            Some(&token),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json["status"], "completed");
    assert_eq!(updated.json["title"], "T");

    let deleted = app
        .request(
            Method::DELETE,
            &format!("/api/tasks/{task_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.json["message"], "Task deleted");

    let listed = app.request(Method::GET, "/api/tasks", None, Some(&token)).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.json, json!([]));
}

#[tokio::test]
async fn register_rejects_duplicates_and_bad_input() {
    let app = TestApp::new().await;
    let credentials = json!({ "email": "dup@example.com", "password": "secret" });

    let first = app
        .request(Method::POST, "/api/auth/register", Some(credentials.clone()), None)
        .await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.json["email"], "dup@example.com");
    assert!(first.json.get("password_hash").is_none());
    assert!(first.json.get("passwordHash").is_none());

    let second = app
        .request(Method::POST, "/api/auth/register", Some(credentials), None)
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert!(second.json["error"].is_string());

    let invalid = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(json!({ "email": "not-an-email", "password": "secret" })),
            None,
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = TestApp::new().await;
    app.register_and_login("known@example.com").await;

    let wrong_password = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "known@example.com", "password": "nope" })),
            None,
        )
        .await;
    let unknown_email = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "ghost@example.com", "password": "nope" })),
            None,
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.json, unknown_email.json);
}

#[tokio::test]
async fn protected_routes_require_valid_token() {
    let app = TestApp::new().await;

    let missing = app.request(Method::GET, "/api/tasks", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let garbage = app
        .request(Method::GET, "/api/tasks", None, Some("not-a-jwt"))
        .await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);

    let basic = app
        .send(
            Request::builder()
                .method(Method::GET)
                .uri("/api/tasks")
                .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .expect("build request"),
        )
        .await;
    assert_eq!(basic.status, StatusCode::UNAUTHORIZED);

    let create = app
        .request(Method::POST, "/api/tasks", Some(json!({ "title": "x" })), None)
        .await;
    assert_eq!(create.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn current_user_resolves_token_owner() {
    let app = TestApp::new().await;
    let token = app.register_and_login("me@example.com").await;

    let me = app.request(Method::GET, "/api/auth/me", None, Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json["email"], "me@example.com");
}

#[tokio::test]
async fn other_users_tasks_are_not_found() {
    let app = TestApp::new().await;
    let alice = app.register_and_login("alice@example.com").await;
    let bob = app.register_and_login("bob@example.com").await;

    let created = app
        .request(
            Method::POST,
            "/api/tasks",
            Some(json!({ "title": "alice only" })),
            Some(&alice),
        )
        .await;
    let task_id = created.json["id"].as_str().expect("task id").to_string();

    let bob_list = app.request(Method::GET, "/api/tasks", None, Some(&bob)).await;
    assert_eq!(bob_list.json, json!([]));

    let bob_update = app
        .request(
            Method::PUT,
            &format!("/api/tasks/{task_id}"),
            Some(json!({ "title": "stolen" })),
            Some(&bob),
        )
        .await;
    assert_eq!(bob_update.status, StatusCode::NOT_FOUND);

    let bob_delete = app
        .request(
            Method::DELETE,
            &format!("/api/tasks/{task_id}"),
            None,
            Some(&bob),
        )
        .await;
    assert_eq!(bob_delete.status, StatusCode::NOT_FOUND);

    let missing = app
        .request(
            Method::DELETE,
            "/api/tasks/does-not-exist",
            None,
            Some(&alice),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(bob_delete.json, missing.json);

    let alice_list = app.request(Method::GET, "/api/tasks", None, Some(&alice)).await;
    assert_eq!(alice_list.json[0]["title"], "alice only");
}

#[tokio::test]
async fn invalid_task_payloads_are_rejected() {
    let app = TestApp::new().await;
    let token = app.register_and_login("val@example.com").await;

    let missing_title = app
        .request(
            Method::POST,
            "/api/tasks",
            Some(json!({ "description": "no title" })),
            Some(&token),
        )
        .await;
    assert_eq!(missing_title.status, StatusCode::BAD_REQUEST);

    let bad_status = app
        .request(
            Method::POST,
            "/api/tasks",
            Some(json!({ "title": "x", "status": "archived" })),
            Some(&token),
        )
        .await;
    assert_eq!(bad_status.status, StatusCode::BAD_REQUEST);

    let malformed = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/tasks")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .expect("build request"),
        )
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert!(malformed.json["error"].is_string());
}

#[tokio::test]
async fn update_null_clears_and_absent_keeps() {
    let app = TestApp::new().await;
    let token = app.register_and_login("patch@example.com").await;

    let created = app
        .request(
            Method::POST,
            "/api/tasks",
            Some(json!({
                "title": "Plan",
                "description": "draft outline",
                "priority": "high",
                "dueDate": "2030-01-15"
            })),
            Some(&token),
        )
        .await;
    assert_eq!(created.json["dueDate"], "2030-01-15");
    let task_id = created.json["id"].as_str().expect("task id").to_string();

    let kept = app
        .request(
            Method::PUT,
            &format!("/api/tasks/{task_id}"),
            Some(json!({ "status": "in-progress" })),
            Some(&token),
        )
        .await;
    assert_eq!(kept.json["description"], "draft outline");
    assert_eq!(kept.json["dueDate"], "2030-01-15");
    assert_eq!(kept.json["priority"], "high");

    let cleared = app
        .request(
            Method::PUT,
            &format!("/api/tasks/{task_id}"),
            Some(json!({ "description": null, "dueDate": null })),
            Some(&token),
        )
        .await;
    assert_eq!(cleared.status, StatusCode::OK);
    assert_eq!(cleared.json["description"], Value::Null);
    assert_eq!(cleared.json["dueDate"], Value::Null);
    assert_eq!(cleared.json["status"], "in-progress");

    let blank = app
        .request(
            Method::PUT,
            &format!("/api/tasks/{task_id}"),
            Some(json!({ "title": "   " })),
            Some(&token),
        )
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    let null_title = app
        .request(
            Method::PUT,
            &format!("/api/tasks/{task_id}"),
            Some(json!({ "title": null })),
            Some(&token),
        )
        .await;
    assert_eq!(null_title.status, StatusCode::BAD_REQUEST);

    let unchanged = app
        .request(Method::GET, "/api/tasks", None, Some(&token))
        .await;
    assert_eq!(unchanged.json[0]["title"], "Plan");
}

#[tokio::test]
async fn list_is_newest_first() {
    let app = TestApp::new().await;
    let token = app.register_and_login("order@example.com").await;

    for title in ["one", "two", "three"] {
        let created = app
            .request(
                Method::POST,
                "/api/tasks",
                Some(json!({ "title": title })),
                Some(&token),
            )
            .await;
        assert_eq!(created.status, StatusCode::CREATED);
    }

    let listed = app.request(Method::GET, "/api/tasks", None, Some(&token)).await;
    let titles: Vec<&str> = listed
        .json
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|task| task["title"].as_str())
        .collect();
    assert_eq!(titles, ["three", "two", "one"]);
}
