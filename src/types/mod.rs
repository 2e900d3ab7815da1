//! Shared data structures for poultry house operational intelligence
//!
//! This module defines the stable external schema of the analytics pipeline:
//! - `TelemetryRecord`: one sampled row of house conditions and flock state
//! - `KpiSnapshot`: growth and efficiency indicators derived from a house history
//! - `Recommendation` / `RecommendationSet`: ranked operator actions with evidence
//! - `SimulationSummary`, `SetpointSuggestion`: results of the auxiliary operations
//!
//! Field names and units are part of the public contract and must not change.

mod telemetry;
mod kpi;
mod recommendation;

pub use telemetry::*;
pub use kpi::*;
pub use recommendation::*;

/// Round to `decimals` places (half away from zero). Non-finite input maps to 0.
pub fn round_dp(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
