//! Farm Service - the operations exposed to the network layer
//!
//! Wires the simulator, KPI estimator, recommendation engine and setpoint
//! mapping to a `TelemetryStore`. Every operation is synchronous; async
//! callers are expected to run them on a blocking thread and to serialize
//! `simulate` against reads.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::defaults::{
    DEFAULT_BIRDS_PER_HOUSE, DEFAULT_SIMULATION_DAYS, DEFAULT_SIMULATION_HOUSES, MAX_DATA_LIMIT,
};
use crate::config::FarmConfig;
use crate::curves::CurveError;
use crate::kpi::{KpiError, KpiEstimator};
use crate::recommendation::{RecommendationEngine, WindowStats};
use crate::setpoints::suggest_setpoints;
use crate::simulator::{SimulationParams, TelemetrySimulator};
use crate::storage::{StorageError, TelemetryStore};
use crate::types::{
    KpiSnapshot, RecommendationSet, SetpointSuggestion, SimulationSummary, TelemetryRecord,
};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no telemetry found for house '{house_id}'")]
    NotFound { house_id: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Configuration(#[from] CurveError),
}

impl From<KpiError> for ServiceError {
    fn from(err: KpiError) -> Self {
        match err {
            KpiError::NotFound(house_id) => ServiceError::NotFound { house_id },
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Simulation request; omitted fields take the documented defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulateRequest {
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default = "default_houses")]
    pub houses: u32,
    #[serde(default = "default_birds")]
    pub birds_per_house: u32,
}

fn default_days() -> u32 { DEFAULT_SIMULATION_DAYS }
fn default_houses() -> u32 { DEFAULT_SIMULATION_HOUSES }
fn default_birds() -> u32 { DEFAULT_BIRDS_PER_HOUSE }

impl Default for SimulateRequest {
    fn default() -> Self {
        Self {
            days: default_days(),
            houses: default_houses(),
            birds_per_house: default_birds(),
        }
    }
}

// ============================================================================
// Service
// ============================================================================

pub struct FarmService<S> {
    config: FarmConfig,
    store: S,
    simulator: TelemetrySimulator,
    engine: RecommendationEngine,
}

impl<S: TelemetryStore> FarmService<S> {
    /// Build every component from one immutable configuration.
    pub fn new(config: FarmConfig, store: S) -> Result<Self, ServiceError> {
        let targets = config.target_provider()?;
        let simulator = TelemetrySimulator::new(targets.clone());
        let engine = RecommendationEngine::new(
            targets,
            config.recommendations.clone(),
            config.anomaly.clone(),
        );
        info!(
            farm = %config.farm.name,
            backend = store.backend_name(),
            "Farm service ready"
        );
        Ok(Self {
            config,
            store,
            simulator,
            engine,
        })
    }

    pub fn config(&self) -> &FarmConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Check a request against the configured bounds.
    pub fn validate_request(&self, req: &SimulateRequest) -> Result<(), ServiceError> {
        let sim = &self.config.simulation;
        let mut problems = Vec::new();
        if req.days < 1 || req.days > sim.max_days {
            problems.push(format!("days must be in 1..={} (got {})", sim.max_days, req.days));
        }
        if req.houses < 1 || req.houses > sim.max_houses {
            problems.push(format!("houses must be in 1..={} (got {})", sim.max_houses, req.houses));
        }
        if req.birds_per_house < sim.min_birds_per_house || req.birds_per_house > sim.max_birds_per_house {
            problems.push(format!(
                "birds_per_house must be in {}..={} (got {})",
                sim.min_birds_per_house, sim.max_birds_per_house, req.birds_per_house
            ));
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::InvalidRequest(problems.join("; ")))
        }
    }

    /// Run the simulator and replace the store contents with the result.
    ///
    /// The simulated clock starts at `[simulation] start`, so repeated calls
    /// with the same request reproduce the same records.
    pub fn simulate(&self, req: &SimulateRequest) -> Result<SimulationSummary, ServiceError> {
        self.validate_request(req)?;

        let sim = &self.config.simulation;
        let params = SimulationParams {
            days: req.days,
            houses: req.houses,
            birds_per_house: req.birds_per_house,
            interval_minutes: sim.interval_minutes,
            seed: sim.seed,
            start: sim.start,
        };

        let records = self.simulator.simulate(&params);
        let rows_written = self.store.replace_all(&records)?;

        Ok(SimulationSummary {
            rows_written,
            houses: req.houses,
            days: req.days,
        })
    }

    /// KPI snapshot over the house's full history.
    pub fn get_kpis(&self, house_id: &str) -> Result<KpiSnapshot, ServiceError> {
        let records = self.store.read_all(house_id)?;
        Ok(KpiEstimator::compute(house_id, &records)?)
    }

    /// Recommendations over the most recent window. Unknown houses get an
    /// empty set.
    pub fn get_recommendations(
        &self,
        house_id: &str,
        bird_age_days: u32,
    ) -> Result<RecommendationSet, ServiceError> {
        let window = self.store.read_recent(house_id, self.engine.window_samples())?;
        Ok(self.engine.build_recommendations(house_id, bird_age_days, &window))
    }

    /// Last `limit` records for a house, timestamp ascending.
    pub fn get_data(&self, house_id: &str, limit: usize) -> Result<Vec<TelemetryRecord>, ServiceError> {
        Ok(self.store.read_recent(house_id, limit.min(MAX_DATA_LIMIT))?)
    }

    /// Controller setpoint hints from the same window the recommendations use.
    pub fn get_setpoints(
        &self,
        house_id: &str,
        bird_age_days: u32,
    ) -> Result<SetpointSuggestion, ServiceError> {
        let window = self.store.read_recent(house_id, self.engine.window_samples())?;
        let stats = WindowStats::from_records(&window);
        let targets = stats
            .as_ref()
            .map(|_| self.engine.targets().resolve(bird_age_days));
        Ok(suggest_setpoints(stats.as_ref(), targets.as_ref()))
    }
}

// ============================================================================
// Tests
// ============================================================================
