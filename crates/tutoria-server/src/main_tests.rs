//! Router tests over an isolated in-memory store

use super::router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;
use tutoria_core::manager::DataManager;
use tutoria_core::storage::Database;

async fn test_router() -> axum::Router {
    let db = Database::in_memory().await.expect("Failed to create database");
    router(DataManager::new(db))
}

#[tokio::test]
async fn test_index_returns_greeting() {
    let app = test_router().await;

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .expect("Request should succeed");

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    assert_eq!(&body[..], b"Hello, World!");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = test_router().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("Request should succeed");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
