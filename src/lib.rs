//! flocksense: poultry house analytics
//!
//! ## Architecture
//!
//! - **Simulator**: Deterministic broiler house telemetry generator
//! - **KPI**: Daily gain, feed conversion and production efficiency
//! - **Anomaly**: Isolation forest over recent environment readings
//! - **Recommendations**: Ordered rule table producing operator actions
//! - **Storage**: Pluggable telemetry store (CSV file or in-memory)
//! - **API**: Axum HTTP surface over the farm service

pub mod anomaly;
pub mod api;
pub mod config;
pub mod curves;
pub mod kpi;
pub mod recommendation;
pub mod service;
pub mod setpoints;
pub mod simulator;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::FarmConfig;

// Re-export commonly used types
pub use types::{
    KpiSnapshot, Priority, Recommendation, RecommendationSet, ResolvedTargets,
    SetpointSuggestion, SimulationSummary, TelemetryRecord,
};

// Re-export components
pub use anomaly::{AnomalyDetector, AnomalyReport};
pub use curves::TargetProvider;
pub use kpi::{compute_kpis, KpiEstimator};
pub use recommendation::RecommendationEngine;
pub use service::{FarmService, ServiceError, SimulateRequest};
pub use simulator::{SimulationParams, TelemetrySimulator};
pub use storage::{CsvStore, InMemoryStore, StorageError, TelemetryStore};
