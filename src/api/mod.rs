//! REST API module using Axum
//!
//! Exposes the farm service over HTTP:
//! - `/health` liveness probe
//! - `/api/v1/*` simulation, data, KPI, recommendation and setpoint endpoints
//!
//! Errors use the uniform envelope from [`envelope`].

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::{ApiState, SharedStore};

use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Comma-separated list of allowed CORS origins. Any origin when unset.
pub const CORS_ORIGINS_ENV_VAR: &str = "FLOCKSENSE_CORS_ORIGINS";

fn build_cors_layer() -> CorsLayer {
    let origin = match std::env::var(CORS_ORIGINS_ENV_VAR) {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            AllowOrigin::list(allowed)
        }
        Err(_) => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Create the complete application router.
pub fn create_app(state: ApiState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(state))
        .merge(routes::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}
