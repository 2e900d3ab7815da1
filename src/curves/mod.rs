//! Target Curve Provider
//!
//! Age-indexed setpoint curves (temperature, light) queried by piecewise-linear
//! interpolation over day-of-age, plus the static environmental bounds
//! (humidity band, CO2 and ammonia ceilings).
//!
//! Curves arrive from configuration as loosely-typed tables keyed by
//! stringified integers. They are converted once, at load time, into a
//! validated [`TargetCurve`]: a sorted list of `(day, value)` pairs. Malformed
//! input is rejected there so that queries can never fail.
//!
//! Queries outside the defined range clamp to the nearest endpoint value.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::warn;

use crate::config::TargetsConfig;
use crate::types::ResolvedTargets;

// ============================================================================
// Engine Defaults
// ============================================================================

/// Default rearing temperature curve (day, °C).
pub const DEFAULT_TEMPERATURE_CURVE: &[(i32, f64)] = &[
    (0, 32.0),
    (7, 29.0),
    (14, 26.0),
    (21, 23.0),
    (28, 21.5),
    (35, 21.0),
];

/// Default lighting program (day, lux).
pub const DEFAULT_LIGHT_CURVE: &[(i32, f64)] = &[(0, 30.0), (7, 20.0), (21, 10.0)];

/// Flat temperature target used when the configured curve is empty (°C).
pub const FALLBACK_TEMPERATURE_C: f64 = 28.0;

/// Default relative humidity comfort band (%).
pub const DEFAULT_HUMIDITY_RANGE: [f64; 2] = [50.0, 70.0];

/// Default CO2 ceiling (ppm).
pub const DEFAULT_CO2_PPM_MAX: f64 = 3000.0;

/// Default ammonia ceiling (ppm).
pub const DEFAULT_NH3_PPM_MAX: f64 = 25.0;

// ============================================================================
// Errors
// ============================================================================

/// Configuration errors raised while building or querying a curve.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CurveError {
    #[error("target curve '{0}' is empty")]
    Empty(String),

    #[error("target curve '{curve}': key '{key}' is not an integer day")]
    InvalidKey { curve: String, key: String },

    #[error("target curve '{curve}': day {day} is defined more than once")]
    DuplicateDay { curve: String, day: i32 },

    #[error("target curve '{curve}': value at day {day} is not a finite number")]
    NonFiniteValue { curve: String, day: i32 },
}

// ============================================================================
// Interpolation
// ============================================================================

/// Interpolate a raw day → value mapping at `day`.
///
/// Clamps to the first/last value outside the key range. Fails only when the
/// curve is empty; callers are expected to substitute their own default.
pub fn interpolate(curve: &BTreeMap<i32, f64>, day: f64) -> Result<f64, CurveError> {
    let points: Vec<(i32, f64)> = curve.iter().map(|(&d, &v)| (d, v)).collect();
    if points.is_empty() {
        return Err(CurveError::Empty("anonymous".to_string()));
    }
    Ok(interpolate_sorted(&points, day))
}

/// Linear interpolation over a non-empty, ascending list of points.
fn interpolate_sorted(points: &[(i32, f64)], day: f64) -> f64 {
    let (first_day, first_value) = points[0];
    let (last_day, last_value) = points[points.len() - 1];

    if day <= f64::from(first_day) {
        return first_value;
    }
    if day >= f64::from(last_day) {
        return last_value;
    }

    for pair in points.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        let (x0, x1) = (f64::from(x0), f64::from(x1));
        if day <= x1 {
            let t = (day - x0) / (x1 - x0);
            return y0 + t * (y1 - y0);
        }
    }

    last_value
}

// ============================================================================
// Validated Curve
// ============================================================================

/// A validated, non-empty, strictly ascending age-indexed curve.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetCurve {
    points: Vec<(i32, f64)>,
}

impl TargetCurve {
    /// Build from `(day, value)` pairs in any order.
    pub fn new(name: &str, mut points: Vec<(i32, f64)>) -> Result<Self, CurveError> {
        if points.is_empty() {
            return Err(CurveError::Empty(name.to_string()));
        }
        if let Some(&(day, _)) = points.iter().find(|(_, v)| !v.is_finite()) {
            return Err(CurveError::NonFiniteValue {
                curve: name.to_string(),
                day,
            });
        }

        points.sort_by_key(|&(day, _)| day);
        if let Some(pair) = points.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(CurveError::DuplicateDay {
                curve: name.to_string(),
                day: pair[0].0,
            });
        }

        Ok(Self { points })
    }

    /// Build from a configuration table keyed by stringified days.
    pub fn from_table(name: &str, table: &BTreeMap<String, f64>) -> Result<Self, CurveError> {
        let points = table
            .iter()
            .map(|(key, &value)| {
                key.trim()
                    .parse::<i32>()
                    .map(|day| (day, value))
                    .map_err(|_| CurveError::InvalidKey {
                        curve: name.to_string(),
                        key: key.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(name, points)
    }

    /// Curve that returns `value` for every day.
    pub fn flat(value: f64) -> Self {
        Self {
            points: vec![(0, value)],
        }
    }

    /// Target value at a (possibly fractional, possibly out-of-range) day.
    pub fn value_at(&self, day: f64) -> f64 {
        interpolate_sorted(&self.points, day)
    }

    pub fn points(&self) -> &[(i32, f64)] {
        &self.points
    }
}

// ============================================================================
// Provider
// ============================================================================

/// Immutable view over all targets, built once from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetProvider {
    temperature: TargetCurve,
    light: TargetCurve,
    humidity_range: [f64; 2],
    co2_ppm_max: f64,
    nh3_ppm_max: f64,
}

impl Default for TargetProvider {
    fn default() -> Self {
        Self {
            temperature: TargetCurve {
                points: DEFAULT_TEMPERATURE_CURVE.to_vec(),
            },
            light: TargetCurve {
                points: DEFAULT_LIGHT_CURVE.to_vec(),
            },
            humidity_range: DEFAULT_HUMIDITY_RANGE,
            co2_ppm_max: DEFAULT_CO2_PPM_MAX,
            nh3_ppm_max: DEFAULT_NH3_PPM_MAX,
        }
    }
}

impl TargetProvider {
    /// Resolve configured curves and bounds, substituting engine defaults for
    /// absent keys.
    ///
    /// An explicitly empty temperature curve falls back to a flat
    /// [`FALLBACK_TEMPERATURE_C`]; any other malformed curve is an error.
    pub fn from_config(cfg: &TargetsConfig) -> Result<Self, CurveError> {
        let defaults = Self::default();

        let temperature = match &cfg.temperature_c_by_day {
            None => defaults.temperature,
            Some(table) => match TargetCurve::from_table("temperature_c_by_day", table) {
                Ok(curve) => curve,
                Err(CurveError::Empty(_)) => {
                    warn!(
                        fallback_c = FALLBACK_TEMPERATURE_C,
                        "temperature_c_by_day is empty, using flat fallback target"
                    );
                    TargetCurve::flat(FALLBACK_TEMPERATURE_C)
                }
                Err(e) => return Err(e),
            },
        };

        let light = match &cfg.light_lux_by_day {
            None => defaults.light,
            Some(table) => TargetCurve::from_table("light_lux_by_day", table)?,
        };

        Ok(Self {
            temperature,
            light,
            humidity_range: cfg.humidity_pct_target_range.unwrap_or(DEFAULT_HUMIDITY_RANGE),
            co2_ppm_max: cfg.co2_ppm_max.unwrap_or(DEFAULT_CO2_PPM_MAX),
            nh3_ppm_max: cfg.ammonia_ppm_max.unwrap_or(DEFAULT_NH3_PPM_MAX),
        })
    }

    pub fn temperature_at(&self, day: f64) -> f64 {
        self.temperature.value_at(day)
    }

    pub fn light_at(&self, day: f64) -> f64 {
        self.light.value_at(day)
    }

    pub fn humidity_range(&self) -> [f64; 2] {
        self.humidity_range
    }

    pub fn co2_ppm_max(&self) -> f64 {
        self.co2_ppm_max
    }

    pub fn nh3_ppm_max(&self) -> f64 {
        self.nh3_ppm_max
    }

    /// All targets for a bird age.
    pub fn resolve(&self, bird_age_days: u32) -> ResolvedTargets {
        let day = f64::from(bird_age_days);
        ResolvedTargets {
            temp_c_target: self.temperature_at(day),
            humidity_pct_range: self.humidity_range,
            co2_ppm_max: self.co2_ppm_max,
            nh3_ppm_max: self.nh3_ppm_max,
            light_lux_target: self.light_at(day),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_curve() -> BTreeMap<i32, f64> {
        BTreeMap::from([(0, 32.0), (7, 29.0), (35, 21.0)])
    }

    #[test]
    fn test_interpolate_clamps_below_range() {
        assert_eq!(interpolate(&sample_curve(), -5.0).unwrap(), 32.0);
    }

    #[test]
    fn test_interpolate_clamps_above_range() {
        assert_eq!(interpolate(&sample_curve(), 100.0).unwrap(), 21.0);
    }

    #[test]
    fn test_interpolate_between_keys() {
        let v = interpolate(&sample_curve(), 3.5).unwrap();
        assert!(v < 32.0 && v > 29.0, "got {v}");
        assert!((v - 30.5).abs() < 1e-9);
    }

    #[test]
    fn test_interpolate_exact_key() {
        assert_eq!(interpolate(&sample_curve(), 7.0).unwrap(), 29.0);
    }

    #[test]
    fn test_interpolate_monotonic_between_bracketing_keys() {
        let curve = sample_curve();
        let mut prev = interpolate(&curve, 7.0).unwrap();
        for step in 1..=28 {
            let v = interpolate(&curve, 7.0 + f64::from(step)).unwrap();
            assert!(v <= prev);
            prev = v;
        }
    }

    #[test]
    fn test_interpolate_empty_is_configuration_error() {
        let result = interpolate(&BTreeMap::new(), 3.0);
        assert!(matches!(result, Err(CurveError::Empty(_))));
    }

    #[test]
    fn test_single_point_curve_is_constant() {
        let curve = TargetCurve::new("single", vec![(10, 5.0)]).unwrap();
        assert_eq!(curve.value_at(-1.0), 5.0);
        assert_eq!(curve.value_at(10.0), 5.0);
        assert_eq!(curve.value_at(99.0), 5.0);
    }

    #[test]
    fn test_from_table_sorts_numerically() {
        let table = BTreeMap::from([
            ("14".to_string(), 26.0),
            ("7".to_string(), 29.0),
            ("0".to_string(), 32.0),
        ]);
        let curve = TargetCurve::from_table("temperature_c_by_day", &table).unwrap();
        assert_eq!(curve.points(), &[(0, 32.0), (7, 29.0), (14, 26.0)]);
    }

    #[test]
    fn test_from_table_rejects_non_integer_key() {
        let table = BTreeMap::from([("seven".to_string(), 29.0)]);
        let err = TargetCurve::from_table("light_lux_by_day", &table).unwrap_err();
        assert!(matches!(err, CurveError::InvalidKey { .. }));
    }

    #[test]
    fn test_from_table_rejects_duplicate_day() {
        let table = BTreeMap::from([("7".to_string(), 29.0), ("07".to_string(), 28.0)]);
        let err = TargetCurve::from_table("temperature_c_by_day", &table).unwrap_err();
        assert_eq!(
            err,
            CurveError::DuplicateDay {
                curve: "temperature_c_by_day".to_string(),
                day: 7
            }
        );
    }

    #[test]
    fn test_new_rejects_nan() {
        let err = TargetCurve::new("t", vec![(0, f64::NAN)]).unwrap_err();
        assert!(matches!(err, CurveError::NonFiniteValue { day: 0, .. }));
    }

    #[test]
    fn test_provider_defaults() {
        let provider = TargetProvider::from_config(&TargetsConfig::default()).unwrap();
        let t = provider.resolve(0);
        assert_eq!(t.temp_c_target, 32.0);
        assert_eq!(t.humidity_pct_range, [50.0, 70.0]);
        assert_eq!(t.co2_ppm_max, 3000.0);
        assert_eq!(t.nh3_ppm_max, 25.0);
        assert_eq!(t.light_lux_target, 30.0);
        assert_eq!(provider.light_at(21.0), 10.0);
        assert_eq!(provider.light_at(14.0), 15.0);
    }

    #[test]
    fn test_provider_empty_temperature_curve_falls_back() {
        let cfg = TargetsConfig {
            temperature_c_by_day: Some(BTreeMap::new()),
            ..Default::default()
        };
        let provider = TargetProvider::from_config(&cfg).unwrap();
        assert_eq!(provider.temperature_at(3.0), FALLBACK_TEMPERATURE_C);
    }

    #[test]
    fn test_provider_rejects_malformed_light_curve() {
        let cfg = TargetsConfig {
            light_lux_by_day: Some(BTreeMap::from([("x".to_string(), 10.0)])),
            ..Default::default()
        };
        assert!(TargetProvider::from_config(&cfg).is_err());
    }
}
