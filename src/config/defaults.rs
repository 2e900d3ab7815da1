//! System-wide default constants.
//!
//! Centralises magic numbers that are not operator-tunable through the
//! configuration document. Grouped by subsystem for easy discovery.

// ============================================================================
// Configuration Discovery
// ============================================================================

/// Environment variable holding an explicit configuration path.
pub const CONFIG_ENV_VAR: &str = "FLOCKSENSE_CONFIG";

/// Configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "flocksense.toml";

/// Environment variable overriding the HTTP bind address.
pub const SERVER_ADDR_ENV_VAR: &str = "FLOCKSENSE_SERVER_ADDR";

// ============================================================================
// Simulation Requests
// ============================================================================

/// Days simulated when a request omits `days`.
pub const DEFAULT_SIMULATION_DAYS: u32 = 7;

/// Houses simulated when a request omits `houses`.
pub const DEFAULT_SIMULATION_HOUSES: u32 = 2;

/// Flock size when a request omits `birds_per_house`.
pub const DEFAULT_BIRDS_PER_HOUSE: u32 = 20_000;

/// Simulated clock start when `[simulation] start` is not configured
/// (2024-01-01T00:00:00Z, Unix seconds).
pub const DEFAULT_SIMULATION_START_UNIX: i64 = 1_704_067_200;

// ============================================================================
// Data Queries
// ============================================================================

/// Number of records returned by the data endpoint when no limit is given.
pub const DEFAULT_DATA_LIMIT: usize = 500;

/// Hard cap on records returned by a single data query.
pub const MAX_DATA_LIMIT: usize = 50_000;
