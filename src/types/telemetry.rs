//! Telemetry record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sampled row of house environment and flock state.
///
/// Within a single house series timestamps are strictly increasing and
/// `birds_alive` never increases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub timestamp: DateTime<Utc>,
    pub house_id: String,

    // === Environment ===
    /// Air temperature (°C)
    pub temp_c: f64,
    /// Relative humidity (%)
    pub humidity_pct: f64,
    /// Carbon dioxide (ppm)
    pub co2_ppm: f64,
    /// Ammonia (ppm)
    pub nh3_ppm: f64,
    /// Ventilation airflow (cubic feet per minute)
    pub airflow_cfm: f64,

    // === Consumption ===
    /// Water flow (litres/hour)
    pub water_lph: f64,
    /// Feed flow (kg/hour)
    pub feed_kgph: f64,

    // === Flock ===
    /// Average live weight per bird (kg)
    pub avg_bird_weight_kg: f64,
    /// Deaths recorded in this sample
    pub mortality_today: u32,
    pub birds_alive: u32,
    /// Whole days elapsed since the house was started
    pub age_days: u32,
    /// Flock size at placement, constant for the run
    pub birds_start: u32,
}

/// Multivariate feature vector used by the anomaly detector.
///
/// Order: temperature, humidity, CO2, ammonia, water flow, feed flow, airflow.
pub const ANOMALY_FEATURE_COUNT: usize = 7;

impl TelemetryRecord {
    /// Environmental and consumption channels fed to the outlier model.
    pub fn anomaly_features(&self) -> [f64; ANOMALY_FEATURE_COUNT] {
        [
            self.temp_c,
            self.humidity_pct,
            self.co2_ppm,
            self.nh3_ppm,
            self.water_lph,
            self.feed_kgph,
            self.airflow_cfm,
        ]
    }

    /// Livability of the flock at this sample (0-100%).
    pub fn livability_pct(&self) -> f64 {
        if self.birds_start == 0 {
            return 0.0;
        }
        100.0 * f64::from(self.birds_alive) / f64::from(self.birds_start)
    }
}

/// Result of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub rows_written: usize,
    pub houses: u32,
    pub days: u32,
}
