//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use waypoint_core::{MockBackend, TripStore, VisionClient};

fn setup_test_app() -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let store = TripStore::new(dir.path());
    let state = Arc::new(AppState::new(store, None));
    (dir, router(state))
}

fn setup_test_app_with_mock(mock: MockBackend) -> (TempDir, TripStore, Router) {
    let dir = tempfile::tempdir().unwrap();
    let store = TripStore::new(dir.path());
    let state = Arc::new(AppState::new(store.clone(), Some(VisionClient::mock(mock))));
    (dir, store, router(state))
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (_dir, app) = setup_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_and_list_trips() {
    let (_dir, app) = setup_test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/trips",
            serde_json::json!({"name": "Austin June 2025"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["name"], "Austin_June_2025");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/trips")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_missing_trip_is_404() {
    let (_dir, app) = setup_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/trips/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_trip_renames_directory() {
    let (_dir, store, app) = setup_test_app_with_mock(MockBackend::new());
    store.create_trip("temp_1").unwrap();

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/api/trips/temp_1",
            serde_json::json!({"name": "Denver Trip", "destination": "Denver, CO"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(!store.trip_exists("temp_1"));
    assert!(store.trip_exists("Denver_Trip"));
    let metadata = store.load_metadata("Denver_Trip").unwrap();
    assert_eq!(metadata.name, "Denver Trip");
    assert_eq!(metadata.destination.as_deref(), Some("Denver, CO"));
}

#[tokio::test]
async fn test_update_trip_rejects_bad_date() {
    let (_dir, store, app) = setup_test_app_with_mock(MockBackend::new());
    store.create_trip("temp_1").unwrap();

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/api/trips/temp_1",
            serde_json::json!({"start_date": "06/12/2025"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_process_without_client_is_503() {
    let (_dir, app) = setup_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/trips/temp_1/process")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_process_endpoint_runs_batch() {
    let mock = MockBackend::new().with_response(
        "lunch",
        r#"{"type": "receipt", "date": "2025-06-14", "merchant": "Taco Stand",
            "amount": 18.5, "category": "Meals"}"#,
    );
    let (_dir, store, app) = setup_test_app_with_mock(mock);
    store.create_trip("temp_1").unwrap();
    std::fs::write(store.receipts_dir("temp_1").join("lunch.jpg"), b"jpeg").unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/trips/temp_1/process")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["expense_count"], 1);
}

#[tokio::test]
async fn test_thumbnail_missing_file_is_404() {
    let (_dir, store, app) = setup_test_app_with_mock(MockBackend::new());
    store.create_trip("temp_1").unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/trips/temp_1/files/nope.jpg/thumbnail")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expenses_for_missing_trip_is_404() {
    let (_dir, app) = setup_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/trips/ghost/expenses")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
