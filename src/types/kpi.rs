//! Production KPI types

use serde::{Deserialize, Serialize};

/// Growth and efficiency indicators for one house, recomputed on demand.
///
/// Derived values are rounded for display: `adg_g_per_day` and `epef` to one
/// decimal, `fcr_estimate` to two. Non-finite results are reported as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub house_id: String,
    /// Age (days) of the most recent record
    pub days: u32,
    pub birds_start: u32,
    pub birds_alive: u32,
    /// Average daily gain (g/bird/day)
    pub adg_g_per_day: f64,
    /// Feed conversion ratio estimate (kg feed / kg gain)
    pub fcr_estimate: f64,
    /// European production efficiency factor
    pub epef: f64,
}
