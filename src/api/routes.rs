//! API route definitions
//!
//! - /health - liveness
//! - /api/v1/simulate - regenerate the telemetry store
//! - /api/v1/data - recent records for a house
//! - /api/v1/kpis - growth and efficiency indicators
//! - /api/v1/recommendations - ranked operator actions
//! - /api/v1/setpoints - controller setpoint hints

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, ApiState};

/// Versioned API routes, nested under `/api/v1`.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/simulate", post(handlers::simulate))
        .route("/data", get(handlers::get_data))
        .route("/kpis", get(handlers::get_kpis))
        .route("/recommendations", get(handlers::get_recommendations))
        .route("/setpoints", get(handlers::get_setpoints))
        .with_state(state)
}

/// Health endpoint at root level
pub fn health_routes() -> Router {
    Router::new().route("/health", get(handlers::health))
}
