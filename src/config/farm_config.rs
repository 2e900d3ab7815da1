//! Farm Configuration - target curves, bounds and tuning as TOML values
//!
//! Every section implements `Default` with the engine's built-in values, so an
//! empty document (or no document at all) yields a fully working setup.
//! Target keys are `Option` because their absence is meaningful: the target
//! provider substitutes its own defaults for anything not configured.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults::{CONFIG_ENV_VAR, CONFIG_FILE_NAME, DEFAULT_SIMULATION_START_UNIX};
use crate::curves::{CurveError, TargetProvider};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a farm deployment.
///
/// Load with `FarmConfig::load()` which searches:
/// 1. `$FLOCKSENSE_CONFIG` env var
/// 2. `./flocksense.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FarmConfig {
    /// Farm identification
    #[serde(default)]
    pub farm: FarmInfo,

    /// Age-indexed curves and static environmental bounds
    #[serde(default)]
    pub targets: TargetsConfig,

    /// Telemetry simulator settings and request bounds
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Recommendation rule thresholds
    #[serde(default)]
    pub recommendations: RecommendationConfig,

    /// Isolation forest settings
    #[serde(default)]
    pub anomaly: AnomalyConfig,

    /// Telemetry store location
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl FarmConfig {
    /// Load configuration using the standard search order:
    /// 1. `$FLOCKSENSE_CONFIG` environment variable
    /// 2. `./flocksense.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), farm = %config.farm.name, "Loaded farm config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./flocksense.toml
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(farm = %config.farm.name, "Loaded farm config from ./{}", CONFIG_FILE_NAME);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", CONFIG_FILE_NAME);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", CONFIG_FILE_NAME);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are reported as warnings only; range and curve errors
    /// reject the document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Build the target provider described by the `[targets]` section.
    pub fn target_provider(&self) -> Result<TargetProvider, CurveError> {
        TargetProvider::from_config(&self.targets)
    }

    /// Validate curves and ranges for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Curves are converted here so malformed tables fail at load time
        self.target_provider()?;

        let (errors, range_warnings) = super::validation::validate_physical_ranges(self);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Curve(CurveError),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Curve(e) => write!(f, "Config curve error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<CurveError> for ConfigError {
    fn from(err: CurveError) -> Self {
        ConfigError::Curve(err)
    }
}

// ============================================================================
// Farm Info
// ============================================================================

/// Identification metadata, appears in logs only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmInfo {
    #[serde(default = "default_farm_name")]
    pub name: String,
}

fn default_farm_name() -> String {
    "DEFAULT".to_string()
}

impl Default for FarmInfo {
    fn default() -> Self {
        Self {
            name: default_farm_name(),
        }
    }
}

// ============================================================================
// Targets
// ============================================================================

/// Age-indexed curves and static bounds as they appear in the document.
///
/// Curve tables use stringified integer days as keys:
///
/// ```toml
/// [targets]
/// temperature_c_by_day = { 0 = 32.0, 7 = 29.0, 35 = 21.0 }
/// humidity_pct_target_range = [50.0, 70.0]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_c_by_day: Option<BTreeMap<String, f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_lux_by_day: Option<BTreeMap<String, f64>>,

    /// `[low, high]` relative humidity band (%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_pct_target_range: Option<[f64; 2]>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2_ppm_max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ammonia_ppm_max: Option<f64>,
}

// ============================================================================
// Simulation
// ============================================================================

/// Telemetry simulator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Sampling interval (minutes)
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,

    /// Random seed; a fixed seed makes runs bit-for-bit reproducible
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Timestamp of the first simulated sample. Fixed so that the same seed
    /// and request always produce the same series.
    #[serde(default = "default_start")]
    pub start: DateTime<Utc>,

    /// Upper bound on `days` accepted from network requests
    #[serde(default = "default_max_days")]
    pub max_days: u32,

    /// Upper bound on `houses` accepted from network requests
    #[serde(default = "default_max_houses")]
    pub max_houses: u32,

    /// Lower bound on `birds_per_house` accepted from network requests
    #[serde(default = "default_min_birds")]
    pub min_birds_per_house: u32,

    /// Upper bound on `birds_per_house` accepted from network requests
    #[serde(default = "default_max_birds")]
    pub max_birds_per_house: u32,
}

fn default_interval_minutes() -> u32 { 15 }
fn default_seed() -> u64 { 7 }
fn default_start() -> DateTime<Utc> {
    DateTime::from_timestamp(DEFAULT_SIMULATION_START_UNIX, 0).unwrap_or_default()
}
fn default_max_days() -> u32 { 60 }
fn default_max_houses() -> u32 { 10 }
fn default_min_birds() -> u32 { 1_000 }
fn default_max_birds() -> u32 { 60_000 }

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            seed: default_seed(),
            start: default_start(),
            max_days: default_max_days(),
            max_houses: default_max_houses(),
            min_birds_per_house: default_min_birds(),
            max_birds_per_house: default_max_birds(),
        }
    }
}

// ============================================================================
// Recommendations
// ============================================================================

/// Rule thresholds for the recommendation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    /// Number of most recent samples forming the analysis window.
    /// 96 samples = 24 hours at 15-minute sampling.
    #[serde(default = "default_window_samples")]
    pub window_samples: usize,

    /// Allowed deviation of mean temperature from target before a
    /// recommendation fires (°C, strict inequality)
    #[serde(default = "default_temperature_tolerance")]
    pub temperature_tolerance_c: f64,

    /// Water:feed ratio above which a leak/health check is recommended
    #[serde(default = "default_water_feed_ratio_max")]
    pub water_feed_ratio_max: f64,

    /// Floor applied to mean feed flow in the water:feed ratio (kg/h)
    #[serde(default = "default_feed_floor")]
    pub feed_floor_kgph: f64,

    /// Anomaly rate above which sensors should be checked (fraction)
    #[serde(default = "default_anomaly_rate_max")]
    pub anomaly_rate_max: f64,
}

fn default_window_samples() -> usize { 96 }
fn default_temperature_tolerance() -> f64 { 1.0 }
fn default_water_feed_ratio_max() -> f64 { 2.5 }
fn default_feed_floor() -> f64 { 0.1 }
fn default_anomaly_rate_max() -> f64 { 0.05 }

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            window_samples: default_window_samples(),
            temperature_tolerance_c: default_temperature_tolerance(),
            water_feed_ratio_max: default_water_feed_ratio_max(),
            feed_floor_kgph: default_feed_floor(),
            anomaly_rate_max: default_anomaly_rate_max(),
        }
    }
}

// ============================================================================
// Anomaly Model
// ============================================================================

/// Isolation forest settings. The model is refit on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Number of isolation trees in the ensemble
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,

    /// Subsample size drawn (without replacement) for each tree
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,

    /// Expected outlier fraction; also the score percentile used as cut-off
    #[serde(default = "default_contamination")]
    pub contamination: f64,

    #[serde(default = "default_anomaly_seed")]
    pub seed: u64,
}

fn default_n_trees() -> usize { 100 }
fn default_max_samples() -> usize { 256 }
fn default_contamination() -> f64 { 0.05 }
fn default_anomaly_seed() -> u64 { 7 }

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            max_samples: default_max_samples(),
            contamination: default_contamination(),
            seed: default_anomaly_seed(),
        }
    }
}

// ============================================================================
// Storage Config
// ============================================================================

/// Telemetry store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the flat CSV store
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./data/simulated.csv")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
        }
    }
}

// ============================================================================
// Server Config
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `FLOCKSENSE_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = FarmConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config = FarmConfig::from_toml_str("").expect("empty TOML should parse");
        assert_eq!(config.simulation.interval_minutes, 15);
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.recommendations.window_samples, 96);
        assert_eq!(config.recommendations.water_feed_ratio_max, 2.5);
        assert_eq!(config.anomaly.n_trees, 100);
        assert!(config.targets.temperature_c_by_day.is_none());
    }

    #[test]
    fn test_partial_toml_override() {
        let toml_str = r#"
[farm]
name = "North-Barns"

[targets]
temperature_c_by_day = { 0 = 33, 7 = 30.5, 35 = 20 }
co2_ppm_max = 2500

[recommendations]
window_samples = 48
"#;
        let config = FarmConfig::from_toml_str(toml_str).expect("partial TOML should parse");
        assert_eq!(config.farm.name, "North-Barns");
        assert_eq!(config.targets.co2_ppm_max, Some(2500.0));
        assert_eq!(config.recommendations.window_samples, 48);
        // Non-overridden values retain defaults
        assert_eq!(config.recommendations.temperature_tolerance_c, 1.0);
        assert!(config.targets.ammonia_ppm_max.is_none());

        let provider = config.target_provider().unwrap();
        assert_eq!(provider.temperature_at(0.0), 33.0);
        assert_eq!(provider.temperature_at(100.0), 20.0);
        assert_eq!(provider.co2_ppm_max(), 2500.0);
        assert_eq!(provider.nh3_ppm_max(), 25.0);
    }

    #[test]
    fn test_malformed_curve_rejected_at_load() {
        let toml_str = r#"
[targets]
light_lux_by_day = { zero = 30 }
"#;
        let result = FarmConfig::from_toml_str(toml_str);
        assert!(matches!(result, Err(ConfigError::Curve(CurveError::InvalidKey { .. }))));
    }

    #[test]
    fn test_validation_catches_inverted_humidity_band() {
        let mut config = FarmConfig::default();
        config.targets.humidity_pct_target_range = Some([70.0, 50.0]);
        let result = config.validate();
        assert!(result.is_err(), "Inverted humidity band should fail validation");
        if let Err(ConfigError::Validation(errors)) = result {
            assert!(errors.iter().any(|e| e.contains("humidity_pct_target_range")));
        }
    }

    #[test]
    fn test_validation_catches_zero_interval() {
        let mut config = FarmConfig::default();
        config.simulation.interval_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_simulation_start_parses_rfc3339() {
        let config = FarmConfig::from_toml_str(
            "[simulation]\nstart = \"2024-03-01T00:00:00Z\"\nseed = 42\n",
        )
        .unwrap();
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.simulation.start.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_simulation_start_defaults_to_fixed_epoch() {
        let config = FarmConfig::from_toml_str("[simulation]
seed = 42
").unwrap();
        assert_eq!(config.simulation.start.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(config.simulation.start, FarmConfig::default().simulation.start);
    }

    #[test]
    fn test_roundtrip_toml() {
        let mut original = FarmConfig::default();
        original.targets.co2_ppm_max = Some(2800.0);
        let toml_str = original.to_toml().expect("serialization should work");
        let roundtripped = FarmConfig::from_toml_str(&toml_str).expect("deserialization should work");
        assert_eq!(roundtripped.targets.co2_ppm_max, Some(2800.0));
        assert_eq!(
            original.recommendations.window_samples,
            roundtripped.recommendations.window_samples
        );
    }

    #[test]
    fn test_load_from_missing_file_is_io_error() {
        let result = FarmConfig::load_from_file(Path::new("/nonexistent/flocksense.toml"));
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }
}
