//! End-to-End Pipeline Tests
//!
//! Drives the full simulate → store → KPI / recommendation / setpoint path
//! through `FarmService`, once against a CSV file on disk and once over
//! HTTP with `tower::ServiceExt::oneshot()`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use flocksense::api::{create_app, ApiState, SharedStore};
use flocksense::storage::{CsvStore, InMemoryStore, TelemetryStore};
use flocksense::{FarmConfig, FarmService, SimulateRequest};

const FIXED_RUN: &str = r#"
[simulation]
start = "2024-05-01T00:00:00Z"
seed = 7
"#;

fn fixed_config() -> FarmConfig {
    FarmConfig::from_toml_str(FIXED_RUN).unwrap()
}

fn three_day_flock() -> SimulateRequest {
    SimulateRequest {
        days: 3,
        houses: 1,
        birds_per_house: 20_000,
    }
}

// ============================================================================
// Service over CSV storage
// ============================================================================

#[test]
fn csv_pipeline_produces_consistent_kpis() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("simulated.csv");
    let service = FarmService::new(fixed_config(), CsvStore::new(&path)).unwrap();

    let summary = service.simulate(&three_day_flock()).unwrap();
    assert_eq!(summary.rows_written, 3 * 96 + 1);
    assert!(path.exists());

    let kpis = service.get_kpis("H1").unwrap();
    assert_eq!(kpis.house_id, "H1");
    assert_eq!(kpis.days, 3);
    assert_eq!(kpis.birds_start, 20_000);
    assert!(kpis.birds_alive <= 20_000);
    assert!(kpis.birds_alive > 19_000);
    assert!(kpis.adg_g_per_day > 0.0);
    assert!(kpis.fcr_estimate > 0.0);
    assert!(kpis.epef > 0.0);
}

#[test]
fn csv_store_survives_service_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("simulated.csv");

    let first = FarmService::new(fixed_config(), CsvStore::new(&path)).unwrap();
    first.simulate(&three_day_flock()).unwrap();
    let before = first.get_kpis("H1").unwrap();

    let second = FarmService::new(fixed_config(), CsvStore::new(&path)).unwrap();
    assert_eq!(second.get_kpis("H1").unwrap(), before);
    assert_eq!(second.store().house_ids().unwrap(), vec!["H1"]);
}

#[test]
fn identical_runs_are_bit_identical() {
    let a = FarmService::new(fixed_config(), InMemoryStore::new()).unwrap();
    let b = FarmService::new(fixed_config(), InMemoryStore::new()).unwrap();
    a.simulate(&three_day_flock()).unwrap();
    b.simulate(&three_day_flock()).unwrap();

    assert_eq!(a.get_data("H1", 10_000).unwrap(), b.get_data("H1", 10_000).unwrap());
    assert_eq!(a.get_kpis("H1").unwrap(), b.get_kpis("H1").unwrap());
    assert_eq!(
        a.get_recommendations("H1", 3).unwrap(),
        b.get_recommendations("H1", 3).unwrap()
    );
}

#[test]
fn recommendations_follow_rule_order() {
    let service = FarmService::new(fixed_config(), InMemoryStore::new()).unwrap();
    service.simulate(&three_day_flock()).unwrap();

    let set = service.get_recommendations("H1", 3).unwrap();
    let order = [
        "Reduce House Temperature",
        "Increase House Temperature",
        "Dry the House (High Humidity)",
        "Raise Humidity (Too Dry)",
        "Lower CO₂ Levels",
        "Control Ammonia (NH₃)",
        "High Water-to-Feed Ratio",
        "Lighting Check",
        "Telemetry Anomalies Detected",
    ];
    let positions: Vec<usize> = set
        .titles()
        .iter()
        .map(|t| order.iter().position(|o| o == t).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", set.titles());

    // Lighting is stated for every non-empty window
    assert!(set.titles().contains(&"Lighting Check"));
    let targets = set.targets.unwrap();
    assert!(targets.humidity_pct_range[0] < targets.humidity_pct_range[1]);
}

// ============================================================================
// HTTP surface
// ============================================================================

async fn call(app: axum::Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
}

#[tokio::test]
async fn http_simulate_then_read_everything() {
    let store: SharedStore = Arc::new(InMemoryStore::new());
    let service = FarmService::new(fixed_config(), store).unwrap();
    let app = create_app(ApiState::new(service));

    let (status, body) = call(
        app.clone(),
        Request::builder()
            .method("POST")
            .uri("/api/v1/simulate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"days": 3, "houses": 2, "birds_per_house": 20000}"#))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows_written"], 2 * (3 * 96 + 1));

    let get = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

    let (status, body) = call(app.clone(), get("/api/v1/data?house_id=H2")).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 3 * 96 + 1);
    assert!(rows.iter().all(|r| r["house_id"] == "H2"));

    let (status, body) = call(app.clone(), get("/api/v1/kpis?house_id=H2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["birds_start"], 20_000);
    assert_eq!(body["days"], 3);

    let (status, body) = call(app.clone(), get("/api/v1/recommendations?house_id=H1&bird_age_days=3")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["recommendations"].as_array().unwrap().iter().all(|r| {
        r["priority"].is_string() && r["actions"].is_array() && r["rationale"].is_string()
    }));

    let (status, body) = call(app.clone(), get("/api/v1/setpoints?house_id=H1&bird_age_days=3")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["ventilation_percent"].is_number());

    let (status, body) = call(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn http_kpis_before_simulation_is_not_found() {
    let store: SharedStore = Arc::new(InMemoryStore::new());
    let app = create_app(ApiState::new(FarmService::new(fixed_config(), store).unwrap()));

    let (status, body) = call(
        app,
        Request::builder().uri("/api/v1/kpis?house_id=H1").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(body["meta"]["version"].is_string());
}
