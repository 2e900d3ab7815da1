//! Farm Configuration Module
//!
//! Provides the static configuration document loaded from TOML: age-indexed
//! target curves, environmental bounds, simulation defaults, rule thresholds,
//! anomaly model settings, storage location and server address.
//!
//! ## Loading Order
//!
//! 1. `--config` CLI flag (explicit path, errors are fatal)
//! 2. `FLOCKSENSE_CONFIG` environment variable (path to TOML file)
//! 3. `flocksense.toml` in the current working directory
//! 4. Built-in defaults
//!
//! ## Usage
//!
//! The configuration is loaded once and passed explicitly to the components
//! that need it; there is no process-global instance.
//!
//! ```ignore
//! let config = FarmConfig::load();
//! let service = FarmService::new(config, CsvStore::new(path))?;
//! ```

mod farm_config;
pub mod defaults;
pub mod validation;

pub use farm_config::*;
