//! Recommendation Engine
//!
//! Combines the target curves, the most recent telemetry window and the
//! anomaly detector into an ordered list of operator recommendations.
//!
//! The engine is a pure function of (window, bird age, configuration):
//! 1. Reduce the window to per-field means ([`WindowStats`])
//! 2. Resolve targets for the bird age
//! 3. Score the window with a freshly fitted anomaly model
//! 4. Apply every rule in [`rules::RULES`] order, keeping those that fire

pub mod rules;

use tracing::debug;

use crate::anomaly::{AnomalyDetector, AnomalyReport};
use crate::config::{AnomalyConfig, FarmConfig, RecommendationConfig};
use crate::curves::{CurveError, TargetProvider};
use crate::types::{RecommendationSet, ResolvedTargets, TelemetryRecord};

// ============================================================================
// Window Statistics
// ============================================================================

/// Arithmetic means of the numeric channels over a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub samples: usize,
    pub temp_c: f64,
    pub humidity_pct: f64,
    pub co2_ppm: f64,
    pub nh3_ppm: f64,
    pub airflow_cfm: f64,
    pub water_lph: f64,
    pub feed_kgph: f64,
}

impl WindowStats {
    /// `None` for an empty window.
    pub fn from_records(window: &[TelemetryRecord]) -> Option<Self> {
        if window.is_empty() {
            return None;
        }
        let n = window.len() as f64;
        let mean = |f: fn(&TelemetryRecord) -> f64| window.iter().map(f).sum::<f64>() / n;

        Some(Self {
            samples: window.len(),
            temp_c: mean(|r| r.temp_c),
            humidity_pct: mean(|r| r.humidity_pct),
            co2_ppm: mean(|r| r.co2_ppm),
            nh3_ppm: mean(|r| r.nh3_ppm),
            airflow_cfm: mean(|r| r.airflow_cfm),
            water_lph: mean(|r| r.water_lph),
            feed_kgph: mean(|r| r.feed_kgph),
        })
    }
}

/// Everything a rule may look at. Rules get shared references only.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub stats: &'a WindowStats,
    pub targets: &'a ResolvedTargets,
    pub config: &'a RecommendationConfig,
    pub anomaly: &'a AnomalyReport,
    pub bird_age_days: u32,
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    targets: TargetProvider,
    config: RecommendationConfig,
    detector: AnomalyDetector,
}

impl RecommendationEngine {
    pub fn new(
        targets: TargetProvider,
        config: RecommendationConfig,
        anomaly: AnomalyConfig,
    ) -> Self {
        Self {
            targets,
            config,
            detector: AnomalyDetector::new(anomaly),
        }
    }

    pub fn from_config(config: &FarmConfig) -> Result<Self, CurveError> {
        Ok(Self::new(
            config.target_provider()?,
            config.recommendations.clone(),
            config.anomaly.clone(),
        ))
    }

    /// Number of most recent samples the caller should pass as the window.
    pub fn window_samples(&self) -> usize {
        self.config.window_samples
    }

    pub fn targets(&self) -> &TargetProvider {
        &self.targets
    }

    /// Build the ordered recommendation set for one house.
    ///
    /// `window` is the house's most recent samples in timestamp order. An
    /// empty window is not an error: the result has no recommendations and
    /// no targets.
    pub fn build_recommendations(
        &self,
        house_id: &str,
        bird_age_days: u32,
        window: &[TelemetryRecord],
    ) -> RecommendationSet {
        let Some(stats) = WindowStats::from_records(window) else {
            debug!(house_id, "No recent samples, returning empty recommendation set");
            return RecommendationSet::empty(house_id, bird_age_days);
        };

        let targets = self.targets.resolve(bird_age_days);
        let features: Vec<_> = window.iter().map(TelemetryRecord::anomaly_features).collect();
        let anomaly = self.detector.analyze(&features);

        let ctx = RuleContext {
            stats: &stats,
            targets: &targets,
            config: &self.config,
            anomaly: &anomaly,
            bird_age_days,
        };

        let recommendations: Vec<_> = rules::RULES
            .iter()
            .filter_map(|(name, rule)| {
                let fired = rule(&ctx);
                if let Some(ref rec) = fired {
                    debug!(house_id, rule = *name, priority = %rec.priority, "Rule fired");
                }
                fired
            })
            .collect();

        debug!(
            house_id,
            bird_age_days,
            samples = stats.samples,
            fired = recommendations.len(),
            anomaly_rate = anomaly.anomaly_rate,
            "Recommendations built"
        );

        RecommendationSet {
            house_id: house_id.to_string(),
            bird_age_days,
            recommendations,
            targets: Some(targets),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;
    use chrono::{Duration, TimeZone, Utc};

    fn engine() -> RecommendationEngine {
        RecommendationEngine::from_config(&FarmConfig::default()).unwrap()
    }

    /// Zero-variance window: every sample identical, so the anomaly rate is 0.
    fn flat_window(n: usize, temp_c: f64, water_lph: f64, feed_kgph: f64) -> Vec<TelemetryRecord> {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| TelemetryRecord {
                timestamp: t0 + Duration::minutes(15 * i as i64),
                house_id: "H1".to_string(),
                temp_c,
                humidity_pct: 60.0,
                co2_ppm: 2000.0,
                nh3_ppm: 10.0,
                airflow_cfm: 6000.0,
                water_lph,
                feed_kgph,
                avg_bird_weight_kg: 1.0,
                mortality_today: 0,
                birds_alive: 20_000,
                age_days: 21,
                birds_start: 20_000,
            })
            .collect()
    }

    #[test]
    fn test_empty_window_returns_empty_set() {
        let set = engine().build_recommendations("H7", 10, &[]);
        assert_eq!(set.house_id, "H7");
        assert!(set.recommendations.is_empty());
        assert!(set.targets.is_none());
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["targets"], serde_json::json!({}));
    }

    #[test]
    fn test_hot_window_yields_exactly_temperature_and_lighting() {
        // Target at day 21 is 23 °C
        let window = flat_window(96, 26.0, 100.0, 50.0);
        let set = engine().build_recommendations("H1", 21, &window);

        assert_eq!(set.titles(), vec!["Reduce House Temperature", "Lighting Check"]);
        assert_eq!(set.recommendations[0].priority, Priority::High);
        assert_eq!(set.recommendations[1].priority, Priority::Low);

        let targets = set.targets.unwrap();
        assert_eq!(targets.temp_c_target, 23.0);
        assert_eq!(targets.light_lux_target, 10.0);
    }

    #[test]
    fn test_water_feed_ratio_rule_in_engine() {
        let window = flat_window(96, 23.0, 250.0, 80.0);
        let set = engine().build_recommendations("H1", 21, &window);
        assert_eq!(set.titles(), vec!["High Water-to-Feed Ratio", "Lighting Check"]);

        let window = flat_window(96, 23.0, 200.0, 80.0);
        let set = engine().build_recommendations("H1", 21, &window);
        assert_eq!(set.titles(), vec!["Lighting Check"]);
    }

    #[test]
    fn test_rule_order_is_evaluation_order() {
        let mut window = flat_window(96, 20.0, 300.0, 50.0);
        for r in &mut window {
            r.humidity_pct = 80.0;
            r.co2_ppm = 3500.0;
            r.nh3_ppm = 30.0;
        }
        let set = engine().build_recommendations("H1", 21, &window);
        assert_eq!(
            set.titles(),
            vec![
                "Increase House Temperature",
                "Dry the House (High Humidity)",
                "Lower CO₂ Levels",
                "Control Ammonia (NH₃)",
                "High Water-to-Feed Ratio",
                "Lighting Check",
            ]
        );
    }

    #[test]
    fn test_window_stats_means() {
        let mut window = flat_window(2, 20.0, 100.0, 50.0);
        window[1].temp_c = 30.0;
        let stats = WindowStats::from_records(&window).unwrap();
        assert_eq!(stats.samples, 2);
        assert_eq!(stats.temp_c, 25.0);
        assert!(WindowStats::from_records(&[]).is_none());
    }
}
