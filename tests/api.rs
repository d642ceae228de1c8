//! Drives the HTTP API against the fixture datasets in `tests/fixtures`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value as JsonValue;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;
use world_population_dashboard::config::AppConfig;
use world_population_dashboard::load_dataset;
use world_population_dashboard::server::{build_router, AppState, DataState};

fn fixture(name: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .to_string_lossy()
        .to_string()
}

fn fixture_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.input.population_csv = fixture("world_population.csv");
    config.input.boundaries = fixture("world.geojson");
    config.server.static_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("web");
    config
}

async fn ready_router() -> axum::Router {
    let config = fixture_config();
    let data = DataState::from(load_dataset(&config).await);
    build_router(Arc::new(AppState::new(&config, data)))
}

async fn failed_router() -> axum::Router {
    let mut config = fixture_config();
    config.input.population_csv = fixture("does_not_exist.csv");
    let data = DataState::from(load_dataset(&config).await);
    build_router(Arc::new(AppState::new(&config, data)))
}

async fn unreachable_router() -> axum::Router {
    let mut config = fixture_config();
    // Nothing listens on port 1
    config.input.population_csv = "http://127.0.0.1:1/world_population.csv".to_string();
    config.input.fetch_timeout_secs = 5;
    let data = DataState::from(load_dataset(&config).await);
    build_router(Arc::new(AppState::new(&config, data)))
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, JsonValue) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, json)
}

#[tokio::test]
async fn options_list_countries_and_fixed_years() {
    let (status, body) = get(ready_router().await, "/api/options").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["countries"], serde_json::json!(["Aruba", "Nigeria", "Chad"]));
    assert_eq!(body["years"].as_array().unwrap().len(), 8);
    assert_eq!(body["years"][0], "1970 Population");
    assert_eq!(body["years"][7], "2022 Population");
}

#[tokio::test]
async fn nigeria_selected_years_in_order() {
    let (status, body) = get(
        ready_router().await,
        "/api/dashboard?country=Nigeria&years=2020%20Population,1970%20Population",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let points = body["population"]["points"].as_array().unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0]["year"], 1970);
    assert_eq!(points[0]["population"], 55_569_264);
    assert_eq!(points[1]["year"], 2020);
    assert_eq!(points[1]["population"], 208_327_405);
    assert_eq!(body["stats"]["area"], 923_768.0);
    assert_eq!(body["map"]["status"], "available");
    assert_eq!(body["map"]["tooltip"], "Nigeria");
}

#[tokio::test]
async fn no_years_is_an_empty_chart() {
    let (status, body) = get(ready_router().await, "/api/dashboard?country=Chad").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["population"]["points"], serde_json::json!([]));
    assert_eq!(body["stats"]["density"], 13.8033);
}

#[tokio::test]
async fn missing_boundary_renders_stats_with_notice() {
    let (status, body) = get(ready_router().await, "/api/dashboard?country=Aruba&years=2022").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["area"], 180.0);
    assert_eq!(body["map"]["status"], "unavailable");
    assert_eq!(
        body["map"]["notice"],
        "No geospatial data available for the selected country."
    );
}

#[tokio::test]
async fn no_country_returns_prompt() {
    let (status, body) = get(ready_router().await, "/api/dashboard?country=").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notice"], "Please select a country to view its data.");
}

#[tokio::test]
async fn unknown_year_is_rejected() {
    let (status, body) = get(ready_router().await, "/api/dashboard?country=Chad&years=1975").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("1975"));
}

#[tokio::test]
async fn unknown_country_is_not_found() {
    let (status, body) = get(ready_router().await, "/api/dashboard?country=Atlantis").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Country not found: Atlantis");
}

#[tokio::test]
async fn locate_finds_country_under_point() {
    let app = ready_router().await;

    let (_, body) = get(app.clone(), "/api/locate?lat=9.0&lon=8.0").await;
    assert_eq!(body["country"], "Nigeria");

    let (_, body) = get(app.clone(), "/api/locate?lat=15.0&lon=19.0").await;
    assert_eq!(body["country"], "Chad");

    // Atlantis has a boundary but no population row
    let (_, body) = get(app, "/api/locate?lat=32.0&lon=-27.0").await;
    assert_eq!(body["country"], JsonValue::Null);
}

#[tokio::test]
async fn coverage_reports_mismatched_names() {
    let (status, body) = get(ready_router().await, "/api/coverage").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], 2);
    assert_eq!(body["records_without_geometry"], serde_json::json!(["Aruba"]));
    assert_eq!(body["geometries_without_record"], serde_json::json!(["Atlantis"]));
}

#[tokio::test]
async fn failed_load_offers_nothing_but_the_notice() {
    let app = failed_router().await;

    let (status, body) = get(app.clone(), "/api/options").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().starts_with("An error occurred:"));
    assert!(body.get("countries").is_none());

    let (status, _) = get(app.clone(), "/api/dashboard?country=Nigeria&years=1970").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = get(app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unavailable");
}

#[tokio::test]
async fn network_failure_offers_nothing_but_the_notice() {
    let app = unreachable_router().await;

    let (status, body) = get(app.clone(), "/api/options").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("An error occurred: request to http://127.0.0.1:1/world_population.csv failed"));

    let (status, _) = get(app, "/api/dashboard?country=Nigeria&years=1970").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn serves_the_page() {
    let response = ready_router()
        .await
        .oneshot(Request::builder().uri("/index.html").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&bytes).contains("World Population Dashboard"));
}
