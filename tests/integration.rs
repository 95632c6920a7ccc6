use std::collections::HashSet;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use courier_track::api::rest::router;
use courier_track::config::Config;
use courier_track::distance::FixedDistance;
use courier_track::pricing::PriceTable;
use courier_track::state::AppState;
use courier_track::store::memory::MemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        http_port: 0,
        log_level: "info".to_string(),
        store_backend: "memory".to_string(),
        data_dir: "unused".to_string(),
        watcher_buffer_size: 8,
        prices: PriceTable::default(),
    }
}

fn setup() -> axum::Router {
    setup_with_distance(10.0)
}

fn setup_with_distance(fixed_km: f64) -> axum::Router {
    let state = AppState::new(
        &test_config(),
        Arc::new(MemoryStore::new()),
        Arc::new(FixedDistance(fixed_km)),
    );
    router(Arc::new(state))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn patch_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn service_draft() -> Value {
    json!({
        "service_tier": "short_haul",
        "first_name": "Maria",
        "last_name": "Alvarez",
        "phone": "1144556677",
        "pickup_address": "Av. Corrientes 1500, Buenos Aires",
        "dropoff_address": "Calle 50 920, La Plata",
        "notes": "ring the bell twice",
        "pickup_latitude": "-34.603700",
        "pickup_longitude": "-58.381600",
        "dropoff_latitude": "-34.921500",
        "dropoff_longitude": "-57.954500",
        "estimated_price": "10000"
    })
}

async fn create_service(app: &axum::Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/services", service_draft()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    body["tracking_code"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["requests"], 0);
    assert_eq!(body["watchers"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("active_watchers"));
}

#[tokio::test]
async fn quote_without_coordinates_returns_base_price() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/quote",
            json!({ "service_tier": "van_parcel" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["service_tier"], "van_parcel");
    assert!(body["distance_km"].is_null());
    assert_eq!(body["estimated_price"], "10000");
}

#[tokio::test]
async fn quote_prices_distance_brackets() {
    let app = setup_with_distance(3.0);
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/quote",
            json!({
                "service_tier": "short_haul",
                "pickup_latitude": "-34.603700",
                "pickup_longitude": "-58.381600",
                "dropoff_latitude": "-34.629000",
                "dropoff_longitude": "-58.383800"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["distance_km"], 3.0);
    assert_eq!(body["estimated_price"], "10000");
}

#[tokio::test]
async fn quote_with_unknown_tier_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/quote",
            json!({ "service_tier": "same_day" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("unknown service tier"));
}

#[tokio::test]
async fn quote_with_partial_coordinates_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/quote",
            json!({
                "service_tier": "short_haul",
                "pickup_latitude": "-34.603700"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["field"], "pickup_longitude");
}

#[tokio::test]
async fn quote_with_bad_coordinate_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/quote",
            json!({
                "service_tier": "short_haul",
                "pickup_latitude": "north-ish",
                "pickup_longitude": "-58.381600",
                "dropoff_latitude": "-34.629000",
                "dropoff_longitude": "-58.383800"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["field"], "pickup_latitude");
}

#[tokio::test]
async fn create_service_returns_tracking_code() {
    let app = setup();
    let response = app
        .oneshot(json_request("POST", "/api/services", service_draft()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "service request created");
    let code = body["tracking_code"].as_str().unwrap();
    assert_eq!(code.len(), 10);
    assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[tokio::test]
async fn create_then_lookup_round_trips() {
    let app = setup();
    let code = create_service(&app).await;

    let response = app
        .oneshot(get_request(&format!("/api/services/{code}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["tracking_code"], code.as_str());
    assert_eq!(body["service_tier"], "short_haul");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["first_name"], "Maria");
    assert_eq!(body["last_name"], "Alvarez");
    assert_eq!(body["notes"], "ring the bell twice");
    assert_eq!(body["estimated_price"], "10000");
    assert!(body["current_latitude"].is_null());
    assert!(body["current_longitude"].is_null());
    assert!(body["position_updated_at"].is_null());
}

#[tokio::test]
async fn create_with_short_phone_returns_400() {
    let app = setup();
    let mut draft = service_draft();
    draft["phone"] = json!("123");

    let response = app
        .oneshot(json_request("POST", "/api/services", draft))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["field"], "phone");
}

#[tokio::test]
async fn create_with_unknown_tier_returns_400() {
    let app = setup();
    let mut draft = service_draft();
    draft["service_tier"] = json!("same_day");

    let response = app
        .oneshot(json_request("POST", "/api/services", draft))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["field"], "service_tier");
}

#[tokio::test]
async fn create_with_bad_latitude_returns_400() {
    let app = setup();
    let mut draft = service_draft();
    draft["pickup_latitude"] = json!("not-a-number");

    let response = app
        .oneshot(json_request("POST", "/api/services", draft))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["field"], "pickup_latitude");
}

#[tokio::test]
async fn created_codes_are_unique() {
    let app = setup();
    let mut codes = HashSet::new();

    for _ in 0..25 {
        codes.insert(create_service(&app).await);
    }

    assert_eq!(codes.len(), 25);
}

#[tokio::test]
async fn lookup_unknown_code_returns_404() {
    let app = setup();
    let response = app
        .oneshot(get_request("/api/services/zzzzzzzzzz"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_location_for_unknown_code_returns_404() {
    let app = setup();
    let response = app
        .oneshot(patch_request(
            "/api/services/zzzzzzzzzz/location",
            json!({ "latitude": -34.6, "longitude": -58.4 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_location_then_lookup_reflects_position() {
    let app = setup();
    let code = create_service(&app).await;

    let response = app
        .clone()
        .oneshot(patch_request(
            &format!("/api/services/{code}/location"),
            json!({ "latitude": -34.6, "longitude": -58.4 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get_request(&format!("/api/services/{code}")))
        .await
        .unwrap();
    let body = body_json(response).await;

    let latitude: f64 = body["current_latitude"].as_str().unwrap().parse().unwrap();
    let longitude: f64 = body["current_longitude"].as_str().unwrap().parse().unwrap();
    assert!((latitude - -34.6).abs() < 1e-6);
    assert!((longitude - -58.4).abs() < 1e-6);
    assert!(body["position_updated_at"].is_string());
}

#[tokio::test]
async fn patch_location_twice_keeps_latest_fix() {
    let app = setup();
    let code = create_service(&app).await;

    for (latitude, longitude) in [(-34.6, -58.4), (-34.61, -58.39)] {
        let response = app
            .clone()
            .oneshot(patch_request(
                &format!("/api/services/{code}/location"),
                json!({ "latitude": latitude, "longitude": longitude }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let response = app
        .oneshot(get_request(&format!("/api/services/{code}")))
        .await
        .unwrap();
    let body = body_json(response).await;

    let latitude: f64 = body["current_latitude"].as_str().unwrap().parse().unwrap();
    assert!((latitude - -34.61).abs() < 1e-6);
}

#[tokio::test]
async fn create_and_update_show_up_in_metrics() {
    let app = setup();
    let code = create_service(&app).await;

    let response = app
        .clone()
        .oneshot(patch_request(
            &format!("/api/services/{code}/location"),
            json!({ "latitude": -34.6, "longitude": -58.4 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get_request("/metrics")).await.unwrap();
    let body = body_string(response).await;

    assert!(body.contains("requests_created_total{outcome=\"success\"} 1"));
    assert!(body.contains("position_updates_total{outcome=\"stored\"} 1"));
}
