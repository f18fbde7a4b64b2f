use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use bookstore_core::{open_pool, BookService, PoolOptions, SqliteBookRepository};
use bookstore_server::{build_router, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: AppState,
    _dir: TempDir,
}

fn app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let pool = open_pool(dir.path().join("book.db"), &PoolOptions::default()).unwrap();
    let repo = SqliteBookRepository::try_new(pool).unwrap();
    let state = AppState::new(BookService::new(repo));
    TestApp {
        router: build_router(state.clone()),
        state,
        _dir: dir,
    }
}

async fn send(app: &TestApp, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(text) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(text.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn go_book() -> String {
    json!({
        "title": "Go Programming Language",
        "author": "Alan Donovan",
        "price": 45.99,
        "category": "Technology"
    })
    .to_string()
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let app = app();

    let (status, created) = send(&app, Method::POST, "/api/v1/books", Some(&go_book())).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();
    assert!(id > 0);
    assert_eq!(created["price"], json!(45.99));
    assert!(created["created_at"].is_string());

    let (status, fetched) = send(&app, Method::GET, &format!("/api/v1/books/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn unprefixed_routes_reach_the_same_catalog() {
    let app = app();
    let (_, created) = send(&app, Method::POST, "/books", Some(&go_book())).await;

    let (status, listed) = send(&app, Method::GET, "/api/v1/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created]));
}

#[tokio::test]
async fn list_on_empty_catalog_is_empty_array() {
    let app = app();
    let (status, listed) = send(&app, Method::GET, "/api/v1/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn missing_book_is_404_with_error_body() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/books/999999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_id_is_400() {
    let app = app();
    for uri in ["/api/v1/books/abc", "/api/v1/books/0", "/api/v1/books/-3"] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn invalid_fields_are_400_and_nothing_is_stored() {
    let app = app();
    let body = json!({ "title": "", "author": "X", "price": 0 }).to_string();

    let (status, error) = send(&app, Method::POST, "/api/v1/books", Some(&body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"].as_str().unwrap().contains("title"));

    let (_, listed) = send(&app, Method::GET, "/api/v1/books", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn malformed_json_is_400() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/api/v1/books", Some("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn update_with_empty_title_keeps_stored_book() {
    let app = app();
    let (_, created) = send(&app, Method::POST, "/api/v1/books", Some(&go_book())).await;
    let uri = format!("/api/v1/books/{}", created["id"]);

    let body = json!({ "title": "", "author": "X", "price": 10 }).to_string();
    let (status, _) = send(&app, Method::PUT, &uri, Some(&body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, fetched) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn update_replaces_fields() {
    let app = app();
    let (_, created) = send(&app, Method::POST, "/api/v1/books", Some(&go_book())).await;
    let uri = format!("/api/v1/books/{}", created["id"]);

    let body = json!({ "title": "Clean Code", "author": "Robert C. Martin", "price": 39.99 })
        .to_string();
    let (status, updated) = send(&app, Method::PUT, &uri, Some(&body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["title"], "Clean Code");
    assert_eq!(updated["category"], "");
    assert_eq!(updated["created_at"], created["created_at"]);
}

#[tokio::test]
async fn update_of_missing_book_with_bad_body_is_404() {
    let app = app();
    let (status, _) = send(&app, Method::PUT, "/api/v1/books/77", Some("[]")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PUT, "/api/v1/books/abc", Some("[]")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_is_204_then_404() {
    let app = app();
    let (_, created) = send(&app, Method::POST, "/api/v1/books", Some(&go_book())).await;
    let uri = format!("/api/v1/books/{}", created["id"]);

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, listed) = send(&app, Method::GET, "/api/v1/books", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn health_and_ready_pass_on_fresh_pool() {
    let app = app();
    for uri in ["/health", "/ready"] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["checks"]["database"], "ok");
    }
}

#[tokio::test]
async fn ready_is_503_when_too_many_connections_are_open() {
    let app = app();
    let held = (0..11)
        .map(|_| app.state.pool().get().unwrap())
        .collect::<Vec<_>>();

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");

    let (status, _) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);

    drop(held);
    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn storage_failure_is_500_with_error_body() {
    let app = app();
    app.state
        .pool()
        .get()
        .unwrap()
        .execute_batch("DROP TABLE books;")
        .unwrap();

    let (status, body) = send(&app, Method::GET, "/api/v1/books", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, Method::POST, "/api/v1/books", Some(&go_book())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}
