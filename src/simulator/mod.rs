//! Telemetry Simulator
//!
//! Generates a plausible, seed-deterministic telemetry series for a set of
//! poultry houses. Each house is simulated in order ("H1", "H2", ...) from a
//! single seeded RNG stream, so a fixed seed, house count, day count and
//! sampling interval always reproduce the same records bit for bit.
//!
//! Per step:
//! - temperature tracks the age-indexed target curve plus noise and a
//!   24-hour diurnal oscillation on simulated time since the first sample
//! - humidity is drawn around a random point inside the comfort band
//! - CO2 and ammonia means rise linearly with bird age
//! - airflow, water and feed grow with age and are floored at small minimums
//! - average weight follows a non-decreasing growth process
//! - mortality is a Poisson count whose rate grows with age

use chrono::{DateTime, Duration, Utc};
use rand::prelude::*;
use rand_distr::{Distribution, Poisson, StandardNormal};
use tracing::{debug, info};

use crate::curves::TargetProvider;
use crate::types::{round_dp, TelemetryRecord};

// ============================================================================
// Flock Constants
// ============================================================================

const MINUTES_PER_DAY: i64 = 1440;

/// Temperature noise around the curve target (°C, std)
const TEMP_NOISE_C: f64 = 1.2;
/// Diurnal oscillation amplitude (°C)
const DIURNAL_AMPLITUDE_C: f64 = 0.5;

const HUMIDITY_NOISE_PCT: f64 = 5.0;
const HUMIDITY_CLAMP: (f64, f64) = (35.0, 85.0);

/// CO2 baseline and accumulation (ppm, ppm/day)
const BASE_CO2_PPM: f64 = 1800.0;
const CO2_PER_DAY: f64 = 30.0;
const CO2_NOISE_PPM: f64 = 200.0;
const CO2_CLAMP: (f64, f64) = (800.0, 5000.0);

/// Ammonia baseline and accumulation (ppm, ppm/day)
const BASE_NH3_PPM: f64 = 10.0;
const NH3_PER_DAY: f64 = 0.5;
const NH3_NOISE_PPM: f64 = 3.0;
const NH3_CLAMP: (f64, f64) = (0.0, 60.0);

const BASE_AIRFLOW_CFM: f64 = 5000.0;
const AIRFLOW_PER_DAY: f64 = 200.0;
const AIRFLOW_NOISE_CFM: f64 = 500.0;
const MIN_AIRFLOW_CFM: f64 = 1000.0;

const BASE_WATER_LPH: f64 = 50.0;
const WATER_PER_DAY: f64 = 8.0;
const WATER_NOISE_LPH: f64 = 6.0;
const MIN_WATER_LPH: f64 = 5.0;

const BASE_FEED_KGPH: f64 = 20.0;
const FEED_PER_DAY: f64 = 6.0;
const FEED_NOISE_KGPH: f64 = 5.0;
const MIN_FEED_KGPH: f64 = 2.0;

/// Chick placement weight (kg)
const PLACEMENT_WEIGHT_KG: f64 = 0.04;
/// Per-sample weight increment: mean grows with age (kg, kg/day, std)
const BASE_GAIN_KG: f64 = 0.03;
const GAIN_PER_DAY: f64 = 0.001;
const GAIN_NOISE_KG: f64 = 0.005;

/// Mortality hazard: base fraction of placed birds plus age term (per sample)
const BASE_HAZARD: f64 = 0.00002;
const HAZARD_PER_DAY: f64 = 0.0005;

// ============================================================================
// Parameters
// ============================================================================

/// One simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub days: u32,
    pub houses: u32,
    pub birds_per_house: u32,
    /// Sampling interval (minutes, > 0)
    pub interval_minutes: u32,
    pub seed: u64,
    /// Timestamp of the first sample of every house
    pub start: DateTime<Utc>,
}

impl SimulationParams {
    /// Number of samples produced per house: `days` worth of intervals,
    /// both endpoints included.
    pub fn samples_per_house(&self) -> usize {
        if self.interval_minutes == 0 {
            return 0;
        }
        let minutes = i64::from(self.days) * MINUTES_PER_DAY;
        (minutes / i64::from(self.interval_minutes)) as usize + 1
    }
}

// ============================================================================
// Simulator
// ============================================================================

/// Generates synthetic telemetry anchored to the configured temperature curve.
#[derive(Debug, Clone)]
pub struct TelemetrySimulator {
    targets: TargetProvider,
}

impl TelemetrySimulator {
    pub fn new(targets: TargetProvider) -> Self {
        Self { targets }
    }

    /// Generate every house's series as one ordered batch (house by house,
    /// timestamps ascending within a house).
    pub fn simulate(&self, params: &SimulationParams) -> Vec<TelemetryRecord> {
        let mut rng = StdRng::seed_from_u64(params.seed);
        let per_house = params.samples_per_house();
        let mut records = Vec::with_capacity(per_house * params.houses as usize);

        for house in 1..=params.houses {
            let house_id = format!("H{house}");
            let mut flock = FlockState::new(params.birds_per_house);
            for step in 0..per_house {
                let elapsed = step as i64 * i64::from(params.interval_minutes);
                let timestamp = params.start + Duration::minutes(elapsed);
                records.push(self.sample(&mut rng, &mut flock, &house_id, timestamp, elapsed));
            }
            debug!(
                house_id = %house_id,
                samples = per_house,
                birds_alive = flock.birds_alive,
                weight_kg = flock.weight_kg,
                "House simulated"
            );
        }

        info!(
            rows = records.len(),
            houses = params.houses,
            days = params.days,
            seed = params.seed,
            "Simulation complete"
        );
        records
    }

    fn sample(
        &self,
        rng: &mut StdRng,
        flock: &mut FlockState,
        house_id: &str,
        timestamp: DateTime<Utc>,
        elapsed_minutes: i64,
    ) -> TelemetryRecord {
        let age_days = (elapsed_minutes / MINUTES_PER_DAY) as u32;
        let age = f64::from(age_days);

        // Phase follows the simulated clock, not the wall-clock hour of `start`
        let hour = (elapsed_minutes % MINUTES_PER_DAY) as f64 / 60.0;
        let target = self.targets.temperature_at(age);
        let temp = normal(rng, target, TEMP_NOISE_C)
            + DIURNAL_AMPLITUDE_C * (2.0 * std::f64::consts::PI * hour / 24.0).sin();

        let [hum_low, hum_high] = self.targets.humidity_range();
        let hum_target = hum_low + (hum_high - hum_low) * rng.gen::<f64>();
        let humidity =
            normal(rng, hum_target, HUMIDITY_NOISE_PCT).clamp(HUMIDITY_CLAMP.0, HUMIDITY_CLAMP.1);

        let co2 = normal(rng, BASE_CO2_PPM + age * CO2_PER_DAY, CO2_NOISE_PPM)
            .clamp(CO2_CLAMP.0, CO2_CLAMP.1);
        let nh3 = normal(rng, BASE_NH3_PPM + age * NH3_PER_DAY, NH3_NOISE_PPM)
            .clamp(NH3_CLAMP.0, NH3_CLAMP.1);

        let airflow = (BASE_AIRFLOW_CFM + age * AIRFLOW_PER_DAY + normal(rng, 0.0, AIRFLOW_NOISE_CFM))
            .max(MIN_AIRFLOW_CFM);
        let water = (BASE_WATER_LPH + age * WATER_PER_DAY + normal(rng, 0.0, WATER_NOISE_LPH))
            .max(MIN_WATER_LPH);
        let feed = (BASE_FEED_KGPH + age * FEED_PER_DAY + normal(rng, 0.0, FEED_NOISE_KGPH))
            .max(MIN_FEED_KGPH);

        // Growth never reverses
        flock.weight_kg += normal(rng, BASE_GAIN_KG + age * GAIN_PER_DAY, GAIN_NOISE_KG).max(0.0);

        let hazard = f64::from(flock.birds_start) * BASE_HAZARD + age * HAZARD_PER_DAY;
        let deaths = poisson(rng, hazard).min(flock.birds_alive);
        flock.birds_alive -= deaths;

        TelemetryRecord {
            timestamp,
            house_id: house_id.to_string(),
            temp_c: round_dp(temp, 2),
            humidity_pct: round_dp(humidity, 1),
            co2_ppm: co2.trunc(),
            nh3_ppm: round_dp(nh3, 1),
            airflow_cfm: airflow.trunc(),
            water_lph: round_dp(water, 1),
            feed_kgph: round_dp(feed, 1),
            avg_bird_weight_kg: round_dp(flock.weight_kg, 3),
            mortality_today: deaths,
            birds_alive: flock.birds_alive,
            age_days,
            birds_start: flock.birds_start,
        }
    }
}

// ============================================================================
// Flock State
// ============================================================================

/// Cumulative per-house state carried between samples. Kept at full
/// precision; only emitted values are rounded.
struct FlockState {
    birds_start: u32,
    birds_alive: u32,
    weight_kg: f64,
}

impl FlockState {
    fn new(birds_start: u32) -> Self {
        Self {
            birds_start,
            birds_alive: birds_start,
            weight_kg: PLACEMENT_WEIGHT_KG,
        }
    }
}

fn normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    mean + std_dev * z
}

fn poisson(rng: &mut StdRng, lambda: f64) -> u32 {
    match Poisson::new(lambda) {
        Ok(dist) => {
            let n: f64 = dist.sample(rng);
            n as u32
        }
        // lambda <= 0 or non-finite: no deaths this sample
        Err(_) => 0,
    }
}

// ============================================================================
// Tests
// ============================================================================
