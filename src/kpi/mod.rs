//! KPI Estimator
//!
//! Turns one house's telemetry history into growth and efficiency indicators:
//! - Average daily gain from day-over-day changes in mean bird weight
//! - Feed conversion ratio as the median of per-day estimates (statrs)
//! - European production efficiency factor from livability, live mass and FCR
//!
//! Numeric edge cases are absorbed by flooring denominators; non-finite
//! results are reported as 0 so the snapshot is always well-formed.

use std::collections::BTreeMap;

use statrs::statistics::{Data, Median};
use thiserror::Error;
use tracing::debug;

use crate::types::{round_dp, KpiSnapshot, TelemetryRecord};

/// FCR reported when fewer than three distinct ages are available
pub const FALLBACK_FCR: f64 = 1.8;

/// Floor on per-bird daily gain (kg) in the FCR denominator
const MIN_DAILY_GAIN_KG: f64 = 1e-6;

/// Floors applied to the EPEF denominators
const MIN_EPEF_DAYS: f64 = 1.0;
const MIN_EPEF_FCR: f64 = 0.5;

/// Sampling period the per-day feed sum is normalised by (hours)
const HOURS_PER_DAY: f64 = 24.0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KpiError {
    #[error("no telemetry found for house '{0}'")]
    NotFound(String),
}

/// Per-day aggregate of one house's samples.
#[derive(Debug, Clone, Copy, Default)]
struct DailyAggregate {
    weight_sum: f64,
    feed_sum: f64,
    samples: usize,
}

impl DailyAggregate {
    fn mean_weight(&self) -> f64 {
        self.weight_sum / self.samples as f64
    }
}

/// Stateless estimator over an ordered house history.
pub struct KpiEstimator;

impl KpiEstimator {
    /// Compute the KPI snapshot for `house_id` from its records (timestamp
    /// ascending). Fails with [`KpiError::NotFound`] when `records` is empty.
    pub fn compute(house_id: &str, records: &[TelemetryRecord]) -> Result<KpiSnapshot, KpiError> {
        let latest = records
            .last()
            .ok_or_else(|| KpiError::NotFound(house_id.to_string()))?;

        let daily = Self::group_by_age(records);
        let mean_weights: Vec<f64> = daily.values().map(DailyAggregate::mean_weight).collect();
        let feed_sums: Vec<f64> = daily.values().map(|d| d.feed_sum).collect();

        let adg = Self::average_daily_gain_g(&mean_weights);
        let fcr = Self::fcr_estimate(&mean_weights, &feed_sums, latest.birds_alive);

        let days = f64::from(latest.age_days);
        let livability = latest.livability_pct();
        let kg_live = latest.avg_bird_weight_kg * f64::from(latest.birds_alive);
        let epef = livability * kg_live * 100.0 / days.max(MIN_EPEF_DAYS) / fcr.max(MIN_EPEF_FCR);

        debug!(
            house_id,
            distinct_days = daily.len(),
            adg,
            fcr,
            epef,
            "KPIs computed"
        );

        Ok(KpiSnapshot {
            house_id: house_id.to_string(),
            days: latest.age_days,
            birds_start: latest.birds_start,
            birds_alive: latest.birds_alive,
            adg_g_per_day: round_dp(adg, 1),
            fcr_estimate: round_dp(fcr, 2),
            epef: round_dp(epef, 1),
        })
    }

    fn group_by_age(records: &[TelemetryRecord]) -> BTreeMap<u32, DailyAggregate> {
        let mut daily: BTreeMap<u32, DailyAggregate> = BTreeMap::new();
        for r in records {
            let day = daily.entry(r.age_days).or_default();
            day.weight_sum += r.avg_bird_weight_kg;
            day.feed_sum += r.feed_kgph;
            day.samples += 1;
        }
        daily
    }

    /// Mean of day-over-day weight differences, kg → g. 0 when undefined.
    fn average_daily_gain_g(mean_weights: &[f64]) -> f64 {
        if mean_weights.len() < 2 {
            return 0.0;
        }
        let diffs: Vec<f64> = mean_weights.windows(2).map(|w| w[1] - w[0]).collect();
        let adg = diffs.iter().sum::<f64>() / diffs.len() as f64 * 1000.0;
        if adg.is_finite() {
            adg
        } else {
            0.0
        }
    }

    /// Median over days after the first of
    /// `(feed_sum / 24) / (max(gain, ε) × birds_alive)`.
    ///
    /// Uses the current `birds_alive` for every day.
    fn fcr_estimate(mean_weights: &[f64], feed_sums: &[f64], birds_alive: u32) -> f64 {
        if mean_weights.len() < 3 {
            return FALLBACK_FCR;
        }
        let birds = f64::from(birds_alive.max(1));

        let per_day: Vec<f64> = (1..mean_weights.len())
            .map(|i| {
                let feed_mass = feed_sums[i] / HOURS_PER_DAY;
                let gain = (mean_weights[i] - mean_weights[i - 1]).max(MIN_DAILY_GAIN_KG);
                feed_mass / (gain * birds)
            })
            .filter(|v| v.is_finite())
            .collect();

        if per_day.is_empty() {
            return 0.0;
        }
        let median = Data::new(per_day).median();
        if median.is_finite() {
            median
        } else {
            0.0
        }
    }
}

/// Convenience wrapper around [`KpiEstimator::compute`].
pub fn compute_kpis(house_id: &str, records: &[TelemetryRecord]) -> Result<KpiSnapshot, KpiError> {
    KpiEstimator::compute(house_id, records)
}

// ============================================================================
// Tests
// ============================================================================
