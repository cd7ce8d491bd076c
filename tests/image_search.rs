//! Brave image lookups against a local stub server.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use learnie::image_search::{BraveImageSearch, ImageSearch};
use learnie::LearnieError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Stub {
    hits: AtomicUsize,
}

async fn images(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);

    if headers.get("x-subscription-token").map(|v| v.as_bytes()) != Some(b"test-key") {
        return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({}))).into_response();
    }
    assert_eq!(params.get("count").map(String::as_str), Some("1"));

    let body = match params.get("q").map(String::as_str) {
        Some("Pablo Picasso 1907 studio") => serde_json::json!({
            "results": [
                {"properties": {"url": "https://x/y.jpg"}},
                {"properties": {"url": "https://x/z.jpg"}}
            ]
        }),
        Some("no properties") => serde_json::json!({ "results": [{"title": "untitled"}] }),
        _ => serde_json::json!({ "results": [] }),
    };
    Json(body).into_response()
}

async fn broken(State(stub): State<Arc<Stub>>) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream failure")
}

async fn garbage(State(stub): State<Arc<Stub>>) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    "<html>not json</html>"
}

async fn start_stub() -> (String, Arc<Stub>) {
    let stub = Arc::new(Stub::default());
    let app = Router::new()
        .route("/images", get(images))
        .route("/broken", get(broken))
        .route("/garbage", get(garbage))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), stub)
}

fn search(base: &str, path: &str) -> BraveImageSearch {
    BraveImageSearch::new(Some("test-key".to_string()))
        .with_endpoint(format!("{}{}", base, path))
        .with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_first_result_url() {
    let (base, stub) = start_stub().await;
    let result = search(&base, "/images")
        .lookup("Pablo Picasso 1907 studio")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.url, "https://x/y.jpg");
    assert_eq!(stub.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_zero_results_give_empty_url() {
    let (base, _stub) = start_stub().await;
    let search = search(&base, "/images");

    let result = search.lookup("zzqx nothing").await.unwrap().unwrap();
    assert!(result.is_empty());

    let result = search.lookup("no properties").await.unwrap().unwrap();
    assert_eq!(result.url, "");
}

#[tokio::test]
async fn test_missing_key_makes_no_request() {
    let (base, stub) = start_stub().await;
    let search = BraveImageSearch::new(None).with_endpoint(format!("{}/images", base));

    let err = search.lookup("cubism").await.unwrap_err();
    assert!(matches!(err, LearnieError::Config(_)));
    assert_eq!(stub.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_provider_failures_are_soft() {
    let (base, stub) = start_stub().await;

    assert!(search(&base, "/broken").lookup("cubism").await.unwrap().is_none());
    assert!(search(&base, "/garbage").lookup("cubism").await.unwrap().is_none());
    assert_eq!(stub.hits.load(Ordering::SeqCst), 2);

    let wrong_key = BraveImageSearch::new(Some("other-key".to_string()))
        .with_endpoint(format!("{}/images", base));
    assert!(wrong_key.lookup("cubism").await.unwrap().is_none());
}

#[tokio::test]
async fn test_unreachable_provider_is_soft() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let search = search(&format!("http://{}", addr), "/images");
    assert!(search.lookup("cubism").await.unwrap().is_none());
}
