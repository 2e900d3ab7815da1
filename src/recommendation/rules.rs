//! Threshold rules
//!
//! Each rule is a pure function of the window statistics, resolved targets
//! and thresholds. Rules never see each other's output; the engine applies
//! all of them in [`RULES`] order and keeps whatever fires.

use crate::types::{Priority, Recommendation};

use super::RuleContext;

/// Signature shared by all rule evaluators.
pub type RuleFn = fn(&RuleContext<'_>) -> Option<Recommendation>;

/// Evaluation order is the output order.
pub const RULES: &[(&str, RuleFn)] = &[
    ("temperature", temperature),
    ("humidity", humidity),
    ("co2", co2),
    ("ammonia", ammonia),
    ("water_feed_ratio", water_feed_ratio),
    ("lighting", lighting),
    ("anomaly", anomaly),
];

/// Mean temperature outside target ± tolerance.
pub fn temperature(ctx: &RuleContext<'_>) -> Option<Recommendation> {
    let mean = ctx.stats.temp_c;
    let target = ctx.targets.temp_c_target;
    let delta = mean - target;
    let tolerance = ctx.config.temperature_tolerance_c;
    let day = ctx.bird_age_days;

    if delta > tolerance {
        Some(
            Recommendation::new(
                "Reduce House Temperature",
                format!("Avg temp {mean:.1}°C is above target {target:.1}°C for day {day}."),
                [
                    "Increase tunnel/sidewall ventilation setpoint by 5–10%.",
                    "Lower heater setpoint by 0.5–1.0°C and monitor chicks behavior.",
                    "Check inlet calibration and air speed across bird level.",
                ],
                Priority::High,
            )
            .with_benefit("Lower heat stress; better feed intake and FCR."),
        )
    } else if delta < -tolerance {
        Some(
            Recommendation::new(
                "Increase House Temperature",
                format!("Avg temp {mean:.1}°C is below target {target:.1}°C for day {day}."),
                [
                    "Increase heater setpoint by 0.5–1.0°C.",
                    "Trim minimum ventilation for heat conservation; avoid CO2/Ammonia rise.",
                    "Verify tightness and pre-heat before placing chicks if at brooding.",
                ],
                Priority::High,
            )
            .with_benefit("Improves comfort and uniformity."),
        )
    } else {
        None
    }
}

/// Mean humidity outside the comfort band.
pub fn humidity(ctx: &RuleContext<'_>) -> Option<Recommendation> {
    let mean = ctx.stats.humidity_pct;
    let (low, high) = (ctx.targets.humidity_low(), ctx.targets.humidity_high());

    if mean > high {
        Some(Recommendation::new(
            "Dry the House (High Humidity)",
            format!("Avg RH {mean:.0}% exceeds {high:.0}%."),
            [
                "Increase minimum ventilation timer.",
                "Add run time on fans after drinker line checks for leaks.",
                "Top-dress litter or add fresh, dry material in wet areas.",
            ],
            Priority::Medium,
        ))
    } else if mean < low {
        Some(Recommendation::new(
            "Raise Humidity (Too Dry)",
            format!("Avg RH {mean:.0}% is below {low:.0}%."),
            [
                "Reduce unnecessary ventilation if gases are fine.",
                "Consider intermittent fogging if available; avoid wet litter.",
            ],
            Priority::Low,
        ))
    } else {
        None
    }
}

pub fn co2(ctx: &RuleContext<'_>) -> Option<Recommendation> {
    let mean = ctx.stats.co2_ppm;
    let ceiling = ctx.targets.co2_ppm_max;
    (mean > ceiling).then(|| {
        Recommendation::new(
            "Lower CO₂ Levels",
            format!("Avg CO₂ {mean:.0} ppm exceeds {ceiling:.0} ppm."),
            [
                "Increase minimum ventilation rate.",
                "Verify igniter/combustion of brooders; ensure fresh air inlets near heaters.",
            ],
            Priority::High,
        )
    })
}

pub fn ammonia(ctx: &RuleContext<'_>) -> Option<Recommendation> {
    let mean = ctx.stats.nh3_ppm;
    let ceiling = ctx.targets.nh3_ppm_max;
    (mean > ceiling).then(|| {
        Recommendation::new(
            "Control Ammonia (NH₃)",
            format!("Avg NH₃ {mean:.1} ppm exceeds {ceiling:.0} ppm."),
            [
                "Add litter amendment where birds lie down.",
                "Increase ventilation if temperature allows.",
                "Fix drinker leaks and adjust height/flow.",
            ],
            Priority::High,
        )
    })
}

/// Water:feed ratio with the feed mean floored; strict inequality.
pub fn water_feed_ratio(ctx: &RuleContext<'_>) -> Option<Recommendation> {
    let ratio = ctx.stats.water_lph / ctx.stats.feed_kgph.max(ctx.config.feed_floor_kgph);
    let limit = ctx.config.water_feed_ratio_max;
    (ratio > limit).then(|| {
        Recommendation::new(
            "High Water-to-Feed Ratio",
            format!(
                "Water:Feed ratio {ratio:.2} is above {limit:.2}; could indicate leaks or health issues."
            ),
            [
                "Walk lines for leaks/spills; adjust nipples.",
                "Check for diarrhea; consult advisor if persists.",
            ],
            Priority::Medium,
        )
    })
}

/// Always fires; states the light program target for the age.
pub fn lighting(ctx: &RuleContext<'_>) -> Option<Recommendation> {
    Some(Recommendation::new(
        "Lighting Check",
        format!(
            "Target light ~{:.0} lux for day {}.",
            ctx.targets.light_lux_target, ctx.bird_age_days
        ),
        [
            "Measure lux at bird level in 10 spots; aim for uniformity.",
            "Gradually step down as per program; avoid sudden changes.",
        ],
        Priority::Low,
    ))
}

pub fn anomaly(ctx: &RuleContext<'_>) -> Option<Recommendation> {
    let rate = ctx.anomaly.anomaly_rate;
    let limit = ctx.config.anomaly_rate_max;
    (rate > limit).then(|| {
        Recommendation::new(
            "Telemetry Anomalies Detected",
            format!(
                "~{:.0}% of points look unusual vs recent history (threshold {:.0}%).",
                rate * 100.0,
                limit * 100.0
            ),
            [
                "Check sensors (calibration, obstruction).",
                "Confirm setpoints match controller display.",
                "Walk the birds and verify comfort cues (spread, noise, panting).",
            ],
            Priority::Medium,
        )
    })
}
