//! End-to-end checks of the `/api/user` surface: the real router, the
//! SeaORM gateway and an in-memory SQLite store.

use std::sync::Arc;
use std::time::Duration;

use api_ingress::{ApiIngress, ApiIngressConfig};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use db::{ConnectOpts, DbHandle};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

use users::api::rest::routes::register_routes;
use users::{bootstrap_schema, SeaOrmUsersRepository, Service};

struct TestApp {
    router: Router,
    _db: DbHandle,
}

impl TestApp {
    async fn new() -> Self {
        let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
            .await
            .expect("connect");
        bootstrap_schema(db.seaorm()).await.expect("schema");

        let repo = Arc::new(SeaOrmUsersRepository::new(db.sea()));
        let service = Arc::new(Service::new(repo));
        let routes = register_routes(Router::new(), service);
        let router = ApiIngress::new(ApiIngressConfig::default()).build_router(routes);
        Self { router, _db: db }
    }

    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        self.send(req.body(body).unwrap()).await
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn create(&self, name: &str, email: &str) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/user/create",
                Some(json!({"name": name, "email": email})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }

    async fn list(&self) -> Vec<Value> {
        let (status, body) = self.call(Method::GET, "/api/user/list", None).await;
        assert_eq!(status, StatusCode::OK);
        body["data"].as_array().cloned().expect("data array")
    }
}

fn ts(v: &Value) -> DateTime<Utc> {
    v.as_str().expect("timestamp").parse().expect("rfc3339")
}

#[tokio::test]
async fn create_alice_then_get_returns_equal_record() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/user/create",
            Some(json!({"name": "Alice", "email": "alice@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "user created");
    let created = &body["data"];
    assert!(!created["id"].as_str().unwrap().is_empty());
    assert_eq!(created["name"], "Alice");
    assert_eq!(created["is_active"], true);
    assert_eq!(created["created_at"], created["updated_at"]);

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = app
        .call(Method::GET, &format!("/api/user/list/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["success"], true);
    assert_eq!(&fetched["data"], created);
}

#[tokio::test]
async fn list_starts_empty_and_keeps_creation_order() {
    let app = TestApp::new().await;

    let (status, body) = app.call(Method::GET, "/api/user/list", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": []}));

    for (i, name) in ["first", "second", "third"].into_iter().enumerate() {
        app.create(name, &format!("u{i}@example.com")).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    let names: Vec<_> = app.list().await.iter().map(|u| u["name"].clone()).collect();
    assert_eq!(names, [json!("first"), json!("second"), json!("third")]);
}

#[tokio::test]
async fn edit_with_empty_name_reports_no_changes() {
    let app = TestApp::new().await;
    let alice = app.create("Alice", "alice@example.com").await;
    let id = alice["id"].as_str().unwrap();

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/user/edit/{id}"),
            Some(json!({"name": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No changes detected.");
    assert_eq!(body["data"]["name"], "Alice");
    assert_eq!(body["data"], alice);

    // Same values as stored are not a change either, and nothing was written.
    let (_, body) = app
        .call(
            Method::PUT,
            &format!("/api/user/edit/{id}"),
            Some(json!({"name": "Alice", "email": "alice@example.com"})),
        )
        .await;
    assert_eq!(body["message"], "No changes detected.");
    let (_, fetched) = app
        .call(Method::GET, &format!("/api/user/list/{id}"), None)
        .await;
    assert_eq!(fetched["data"]["updated_at"], alice["updated_at"]);
}

#[tokio::test]
async fn edit_applies_only_non_empty_fields() {
    let app = TestApp::new().await;
    let alice = app.create("Alice", "alice@example.com").await;
    let id = alice["id"].as_str().unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/user/edit/{id}"),
            Some(json!({"name": "Alicia", "email": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User updated.");
    assert_eq!(body["data"]["name"], "Alicia");
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert_eq!(body["data"]["created_at"], alice["created_at"]);
    assert!(ts(&body["data"]["updated_at"]) > ts(&alice["updated_at"]));
}

#[tokio::test]
async fn edit_rejects_bad_email_and_unknown_user() {
    let app = TestApp::new().await;
    let alice = app.create("Alice", "alice@example.com").await;
    let id = alice["id"].as_str().unwrap();

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/user/edit/{id}"),
            Some(json!({"email": "not-an-email"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"success": false, "message": "invalid request body"})
    );

    let missing = uuid::Uuid::new_v4();
    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/user/edit/{missing}"),
            Some(json!({"name": "Ghost"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn edit_rejects_whitespace_only_name() {
    let app = TestApp::new().await;
    let alice = app.create("Alice", "alice@example.com").await;
    let id = alice["id"].as_str().unwrap();

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/user/edit/{id}"),
            Some(json!({"name": "   "})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"success": false, "message": "invalid request body"})
    );

    let (_, fetched) = app
        .call(Method::GET, &format!("/api/user/list/{id}"), None)
        .await;
    assert_eq!(fetched["data"], alice);
}

#[tokio::test]
async fn edit_to_taken_email_is_conflict() {
    let app = TestApp::new().await;
    let a = app.create("A", "a@example.com").await;
    let b = app.create("B", "b@example.com").await;
    let b_id = b["id"].as_str().unwrap();

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/user/edit/{b_id}"),
            Some(json!({"email": "a@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "user already exists");
    assert_eq!(body["data"], a);

    let (_, fetched) = app
        .call(Method::GET, &format!("/api/user/list/{b_id}"), None)
        .await;
    assert_eq!(fetched["data"]["email"], "b@example.com");
}

#[tokio::test]
async fn toggle_twice_restores_flag_with_increasing_updated_at() {
    let app = TestApp::new().await;
    let alice = app.create("Alice", "alice@example.com").await;
    let uri = format!("/api/user/manage/{}", alice["id"].as_str().unwrap());

    tokio::time::sleep(Duration::from_millis(2)).await;
    let (status, off) = app.call(Method::PUT, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(off["message"], "User updated.");
    assert_eq!(off["data"]["is_active"], false);

    tokio::time::sleep(Duration::from_millis(2)).await;
    let (status, on) = app.call(Method::PUT, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(on["data"]["is_active"], true);

    let t0 = ts(&alice["updated_at"]);
    let t1 = ts(&off["data"]["updated_at"]);
    let t2 = ts(&on["data"]["updated_at"]);
    assert!(t0 < t1 && t1 < t2);
}

#[tokio::test]
async fn toggle_unknown_user_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/user/manage/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn get_unknown_id_is_not_found_without_data() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(Method::GET, "/api/user/list/doesnotexist", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"success": false, "message": "no user found for this id"})
    );

    let (status, _) = app
        .call(
            Method::GET,
            &format!("/api/user/list/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_create_is_conflict_carrying_first_record() {
    let app = TestApp::new().await;
    let first = app.create("Alice", "alice@example.com").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/user/create",
            Some(json!({"name": "Impostor", "email": "alice@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "user already exists");
    assert_eq!(body["data"], first);
    assert_eq!(app.list().await.len(), 1);
}

#[tokio::test]
async fn create_rejects_invalid_bodies() {
    let app = TestApp::new().await;

    let bodies = [
        json!({"name": "Alice"}),
        json!({"email": "alice@example.com"}),
        json!({"name": "   ", "email": "alice@example.com"}),
        json!({"name": "Alice", "email": "not-an-email"}),
        json!({"name": 42, "email": "alice@example.com"}),
    ];
    for body in bodies {
        let (status, res) = app
            .call(Method::POST, "/api/user/create", Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(res["message"], "invalid request body");
    }

    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/api/user/create")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, res) = app.send(malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["message"], "invalid request body");

    assert!(app.list().await.is_empty());
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = TestApp::new().await;
    let alice = app.create("Alice", "alice@example.com").await;
    let id = alice["id"].as_str().unwrap();

    let (status, body) = app
        .call(Method::DELETE, &format!("/api/user/delete/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "message": "User deleted successfully"})
    );

    let (status, _) = app
        .call(Method::GET, &format!("/api/user/list/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/user/delete/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.list().await.is_empty());
}

#[tokio::test]
async fn empty_id_is_bad_request() {
    let app = TestApp::new().await;

    let cases = [
        (Method::GET, "/api/user/list/"),
        (Method::GET, "/api/user/list/%20"),
        (Method::PUT, "/api/user/edit/"),
        (Method::PUT, "/api/user/manage/"),
        (Method::DELETE, "/api/user/delete/"),
    ];
    for (method, uri) in cases {
        let (status, body) = app.call(method, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            body,
            json!({"success": false, "message": "id is required"}),
            "{uri}"
        );
    }
}

#[tokio::test]
async fn responses_carry_request_id_and_no_cache_headers() {
    let app = TestApp::new().await;
    let res = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/user/list")
                .header("x-request-id", "users-req-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-request-id"], "users-req-1");
    assert_eq!(
        res.headers()[header::CACHE_CONTROL],
        "no-cache, no-store, must-revalidate"
    );
}

#[tokio::test]
async fn undecodable_id_is_enveloped_bad_request() {
    let app = TestApp::new().await;

    let (status, body) = app.call(Method::GET, "/api/user/list/%FF", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body.get("data").is_none());
}
