//! API route handlers
//!
//! Handlers take a read (or, for `simulate`, write) guard on the shared
//! store lock, then run the synchronous service call on a blocking thread.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::envelope::ApiErrorResponse;
use crate::config::defaults::DEFAULT_DATA_LIMIT;
use crate::service::{FarmService, ServiceError, SimulateRequest};
use crate::storage::TelemetryStore;
use crate::types::TelemetryRecord;

// ============================================================================
// API State
// ============================================================================

/// Store handle used by the server.
pub type SharedStore = Arc<dyn TelemetryStore>;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<FarmService<SharedStore>>,
    /// Serializes full-replace writes against reads
    pub store_lock: Arc<RwLock<()>>,
}

impl ApiState {
    pub fn new(service: FarmService<SharedStore>) -> Self {
        Self {
            service: Arc::new(service),
            store_lock: Arc::new(RwLock::new(())),
        }
    }
}

/// Run a service call on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, Response>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.into_response()),
        Err(e) => Err(ApiErrorResponse::internal(format!("worker failed: {e}"))),
    }
}

// ============================================================================
// Query types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HouseQuery {
    pub house_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DataQuery {
    pub house_id: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Any integer age is accepted; negative ages clamp to day 0.
#[derive(Debug, Deserialize)]
pub struct AgeQuery {
    pub house_id: String,
    pub bird_age_days: i64,
}

impl AgeQuery {
    fn age_days(&self) -> u32 {
        u32::try_from(self.bird_age_days.max(0)).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse {
    pub data: Vec<TelemetryRecord>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health() -> Response {
    Json(serde_json::json!({ "status": "ok" })).into_response()
}

/// POST /api/v1/simulate
pub async fn simulate(
    State(state): State<ApiState>,
    body: Result<Json<SimulateRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(e) => return ApiErrorResponse::bad_request(e.body_text()),
    };

    let _guard = state.store_lock.write().await;
    let service = Arc::clone(&state.service);
    match run_blocking(move || service.simulate(&req)).await {
        Ok(summary) => Json(summary).into_response(),
        Err(resp) => resp,
    }
}

/// GET /api/v1/data?house_id=H1&limit=500
pub async fn get_data(
    State(state): State<ApiState>,
    query: Result<Query<DataQuery>, QueryRejection>,
) -> Response {
    let q = match query {
        Ok(Query(q)) => q,
        Err(e) => return ApiErrorResponse::bad_request(e.body_text()),
    };

    let _guard = state.store_lock.read().await;
    let service = Arc::clone(&state.service);
    let limit = q.limit.unwrap_or(DEFAULT_DATA_LIMIT);
    match run_blocking(move || service.get_data(&q.house_id, limit)).await {
        Ok(data) => Json(DataResponse { data }).into_response(),
        Err(resp) => resp,
    }
}

/// GET /api/v1/kpis?house_id=H1
pub async fn get_kpis(
    State(state): State<ApiState>,
    query: Result<Query<HouseQuery>, QueryRejection>,
) -> Response {
    let q = match query {
        Ok(Query(q)) => q,
        Err(e) => return ApiErrorResponse::bad_request(e.body_text()),
    };

    let _guard = state.store_lock.read().await;
    let service = Arc::clone(&state.service);
    match run_blocking(move || service.get_kpis(&q.house_id)).await {
        Ok(kpis) => Json(kpis).into_response(),
        Err(resp) => resp,
    }
}

/// GET /api/v1/recommendations?house_id=H1&bird_age_days=21
pub async fn get_recommendations(
    State(state): State<ApiState>,
    query: Result<Query<AgeQuery>, QueryRejection>,
) -> Response {
    let q = match query {
        Ok(Query(q)) => q,
        Err(e) => return ApiErrorResponse::bad_request(e.body_text()),
    };

    let _guard = state.store_lock.read().await;
    let service = Arc::clone(&state.service);
    match run_blocking(move || service.get_recommendations(&q.house_id, q.age_days())).await {
        Ok(set) => Json(set).into_response(),
        Err(resp) => resp,
    }
}

/// GET /api/v1/setpoints?house_id=H1&bird_age_days=21
pub async fn get_setpoints(
    State(state): State<ApiState>,
    query: Result<Query<AgeQuery>, QueryRejection>,
) -> Response {
    let q = match query {
        Ok(Query(q)) => q,
        Err(e) => return ApiErrorResponse::bad_request(e.body_text()),
    };

    let _guard = state.store_lock.read().await;
    let service = Arc::clone(&state.service);
    match run_blocking(move || service.get_setpoints(&q.house_id, q.age_days())).await {
        Ok(s) => Json(s).into_response(),
        Err(resp) => resp,
    }
}
