//! Controller setpoint suggestions
//!
//! Simple proportional mapping from the recent window means and the resolved
//! targets to heater, ventilation and minimum-ventilation-timer hints. Each
//! output is present only when its inputs are.

use crate::recommendation::WindowStats;
use crate::types::{round_dp, ResolvedTargets, SetpointSuggestion};

/// Ventilation output when the house sits exactly on target (%)
const BASE_VENTILATION_PCT: f64 = 40.0;
/// Ventilation change per °C of deviation from target (%/°C)
const VENTILATION_GAIN_PCT_PER_C: f64 = 10.0;

/// Minimum ventilation timer (seconds on per 5-minute cycle)
const VENT_TIMER_HUMID_SEC: u32 = 30;
const VENT_TIMER_NORMAL_SEC: u32 = 10;

pub fn suggest_setpoints(
    stats: Option<&WindowStats>,
    targets: Option<&ResolvedTargets>,
) -> SetpointSuggestion {
    let (Some(stats), Some(targets)) = (stats, targets) else {
        return SetpointSuggestion::default();
    };

    let target = targets.temp_c_target;
    let ventilation = BASE_VENTILATION_PCT + (stats.temp_c - target) * VENTILATION_GAIN_PCT_PER_C;

    let timer = if stats.humidity_pct > targets.humidity_high() {
        VENT_TIMER_HUMID_SEC
    } else {
        VENT_TIMER_NORMAL_SEC
    };

    SetpointSuggestion {
        heater_setpoint_c: Some(round_dp(target, 1)),
        ventilation_percent: Some(ventilation.clamp(0.0, 100.0)),
        min_vent_timer_sec_per_5min: Some(timer),
    }
}
