use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use common::http_client::HttpClient;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use weather_tracker::api_client::WeatherApiClient;
use weather_tracker::cache::DEFAULT_TTL_SECONDS;
use weather_tracker::handlers::{AppState, router};
use weather_tracker::{CacheStore, WeatherCatalog, WeatherCoordinator};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn forecast_body(name: &str) -> String {
    json!({
        "location": { "name": name, "region": "", "country": "Norway", "lat": 59.91, "lon": 10.75 },
        "current": { "temp_c": -3.0, "condition": { "text": "Light snow", "code": 1213 } },
        "forecast": { "forecastday": [] }
    })
    .to_string()
}

fn state(base_url: &str, cache_dir: &std::path::Path) -> AppState {
    let api_client = WeatherApiClient::new(
        HttpClient::new(5, 0).expect("Failed to build client"),
        base_url.to_string(),
        "test-key".to_string(),
    );
    AppState {
        coordinator: Arc::new(WeatherCoordinator::new(
            CacheStore::with_ttl(cache_dir, DEFAULT_TTL_SECONDS),
            api_client,
            Arc::new(WeatherCatalog::new()),
            CancellationToken::new(),
        )),
    }
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

#[tokio::test]
async fn test_health() {
    let dir = tempdir().unwrap();
    let app = router(state("http://127.0.0.1:1", dir.path()));

    let response = app.oneshot(empty_request(Method::GET, "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_add_list_and_remove_city() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    Mock::given(method("GET"))
        .and(path("/forecast.json"))
        .and(query_param("q", "Oslo"))
        .respond_with(ResponseTemplate::new(200).set_body_string(forecast_body("Oslo")))
        .expect(1)
        .mount(&server)
        .await;
    let app = router(state(&server.uri(), dir.path()));

    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/weather/cities", json!({ "city": "Oslo" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["source"], "network");
    assert_eq!(body["snapshot"]["basis"], "city");

    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/weather/cities", json!({ "city": "Oslo" })))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["source"], "cache");

    let response = app
        .clone()
        .oneshot(empty_request(Method::GET, "/api/weather"))
        .await
        .unwrap();
    let list = body_json(response).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["payload"]["location"]["name"], "Oslo");

    let response = app
        .clone()
        .oneshot(empty_request(Method::DELETE, "/api/weather/cities/Oslo"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["removed"], true);

    let response = app
        .oneshot(empty_request(Method::GET, "/api/weather"))
        .await
        .unwrap();
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_add_city_provider_failure() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let app = router(state(&server.uri(), dir.path()));

    let response = app
        .oneshot(json_request(Method::POST, "/api/weather/cities", json!({ "city": "Oslo" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_json(response).await["error"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn test_add_blank_city_rejected() {
    let dir = tempdir().unwrap();
    let app = router(state("http://127.0.0.1:1", dir.path()));

    let response = app
        .oneshot(json_request(Method::POST, "/api/weather/cities", json!({ "city": "" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_location_update_accepted() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    Mock::given(method("GET"))
        .and(query_param("q", "59.91,10.75"))
        .respond_with(ResponseTemplate::new(200).set_body_string(forecast_body("Oslo")))
        .mount(&server)
        .await;
    let state = state(&server.uri(), dir.path());
    let mut updates = state.coordinator.catalog().subscribe();
    let app = router(state.clone());

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/weather/location",
            json!({ "latitude": 59.91, "longitude": 10.75 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    tokio::time::timeout(std::time::Duration::from_secs(5), updates.changed())
        .await
        .expect("Catalog was not updated")
        .unwrap();
    assert_eq!(state.coordinator.catalog().snapshot()[0].display_name(), "Oslo");
}

#[tokio::test]
async fn test_clear_cache_endpoint() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("Oslo.json"), forecast_body("Oslo")).unwrap();
    std::fs::write(dir.path().join("readme.txt"), "not a cache file").unwrap();
    let app = router(state("http://127.0.0.1:1", dir.path()));

    let response = app
        .oneshot(empty_request(Method::DELETE, "/api/cache"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["removed"], 1);
    assert_eq!(report["failed"], 0);
    assert!(dir.path().join("readme.txt").exists());
}
