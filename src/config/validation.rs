//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Keys whose values are free-form tables (day-indexed curves). Their
/// children are data, not config keys, and are never walked.
const CURVE_KEYS: &[&str] = &["targets.temperature_c_by_day", "targets.light_lux_by_day"];

/// Returns the complete set of valid dotted key paths for FarmConfig.
///
/// Maintained manually to match the struct hierarchy in farm_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [farm]
        "farm",
        "farm.name",
        // [targets]
        "targets",
        "targets.temperature_c_by_day",
        "targets.light_lux_by_day",
        "targets.humidity_pct_target_range",
        "targets.co2_ppm_max",
        "targets.ammonia_ppm_max",
        // [simulation]
        "simulation",
        "simulation.interval_minutes",
        "simulation.seed",
        "simulation.start",
        "simulation.max_days",
        "simulation.max_houses",
        "simulation.min_birds_per_house",
        "simulation.max_birds_per_house",
        // [recommendations]
        "recommendations",
        "recommendations.window_samples",
        "recommendations.temperature_tolerance_c",
        "recommendations.water_feed_ratio_max",
        "recommendations.feed_floor_kgph",
        "recommendations.anomaly_rate_max",
        // [anomaly]
        "anomaly",
        "anomaly.n_trees",
        "anomaly.max_samples",
        "anomaly.contamination",
        "anomaly.seed",
        // [storage]
        "storage",
        "storage.data_path",
        // [server]
        "server",
        "server.addr",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`. Curve tables are reported but not descended into.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() && !CURVE_KEYS.contains(&path.as_str()) {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        // Tie-break on the key itself so suggestions are stable across runs
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| {
            let suggestion = suggest_correction(&key, &known);
            ValidationWarning {
                message: format!("Unknown config key '{key}'"),
                field: key,
                suggestion,
            }
        })
        .collect()
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Validate physical ranges on a parsed FarmConfig.
///
/// Returns (errors, warnings): errors are impossible values that must
/// prevent startup; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::FarmConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let t = &config.targets;

    if let Some([low, high]) = t.humidity_pct_target_range {
        if !(low.is_finite() && high.is_finite()) || low < 0.0 || high > 100.0 || low >= high {
            errors.push(format!(
                "targets.humidity_pct_target_range = [{low:.1}, {high:.1}] must satisfy 0 <= low < high <= 100"
            ));
        }
    }

    for (name, value) in [
        ("targets.co2_ppm_max", t.co2_ppm_max),
        ("targets.ammonia_ppm_max", t.ammonia_ppm_max),
    ] {
        if let Some(v) = value {
            if !v.is_finite() || v <= 0.0 {
                errors.push(format!("{name} = {v} must be a positive number"));
            }
        }
    }

    // CO2 ceilings above 10 000 ppm are far beyond any welfare guideline
    if let Some(co2) = t.co2_ppm_max {
        if co2 > 10_000.0 {
            warnings.push(ValidationWarning {
                field: "targets.co2_ppm_max".to_string(),
                message: format!("co2_ppm_max = {co2:.0} is outside typical range (1000-10000 ppm)"),
                suggestion: None,
            });
        }
    }

    let s = &config.simulation;
    if s.interval_minutes == 0 {
        errors.push("simulation.interval_minutes must be > 0".to_string());
    } else if 1440 % s.interval_minutes != 0 {
        warnings.push(ValidationWarning {
            field: "simulation.interval_minutes".to_string(),
            message: format!(
                "interval_minutes = {} does not divide a day evenly; samples per day will vary",
                s.interval_minutes
            ),
            suggestion: None,
        });
    }
    if s.max_days == 0 || s.max_houses == 0 {
        errors.push("simulation.max_days and simulation.max_houses must be > 0".to_string());
    }
    if s.min_birds_per_house == 0 || s.min_birds_per_house > s.max_birds_per_house {
        errors.push(format!(
            "simulation bird bounds invalid: min_birds_per_house ({}) must be >= 1 and <= max_birds_per_house ({})",
            s.min_birds_per_house, s.max_birds_per_house
        ));
    }

    let r = &config.recommendations;
    if r.window_samples == 0 {
        errors.push("recommendations.window_samples must be > 0".to_string());
    }
    for (name, value) in [
        ("recommendations.temperature_tolerance_c", r.temperature_tolerance_c),
        ("recommendations.water_feed_ratio_max", r.water_feed_ratio_max),
        ("recommendations.feed_floor_kgph", r.feed_floor_kgph),
        ("recommendations.anomaly_rate_max", r.anomaly_rate_max),
    ] {
        if !value.is_finite() || value < 0.0 {
            errors.push(format!("{name} = {value} must be a non-negative finite number"));
        }
    }
    // feed floor is a divisor
    if r.feed_floor_kgph <= 0.0 {
        errors.push("recommendations.feed_floor_kgph must be > 0 (used as divisor)".to_string());
    }

    let a = &config.anomaly;
    if a.n_trees == 0 {
        errors.push("anomaly.n_trees must be > 0".to_string());
    }
    if a.max_samples < 2 {
        errors.push(format!("anomaly.max_samples = {} must be >= 2", a.max_samples));
    }
    if !(a.contamination > 0.0 && a.contamination <= 0.5) {
        errors.push(format!(
            "anomaly.contamination = {} must be in (0, 0.5]",
            a.contamination
        ));
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("seed", "seed"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("co2_ppm_mx", "co2_ppm_max"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [simulation]
            seed = 3
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"simulation".to_string()));
        assert!(keys.contains(&"simulation.seed".to_string()));
    }

    #[test]
    fn test_walk_does_not_descend_into_curves() {
        let toml: toml::Value = r#"
            [targets]
            temperature_c_by_day = { 0 = 32, 7 = 29 }
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"targets.temperature_c_by_day".to_string()));
        assert!(!keys.iter().any(|k| k.starts_with("targets.temperature_c_by_day.")));
    }

    #[test]
    fn test_unknown_key_warning_with_suggestion() {
        let warnings = validate_unknown_keys("[targets]\nco2_ppm_mx = 2000\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "targets.co2_ppm_mx");
        assert_eq!(warnings[0].suggestion.as_deref(), Some("targets.co2_ppm_max"));
    }

    #[test]
    fn test_curve_days_are_not_unknown_keys() {
        let warnings = validate_unknown_keys("[targets]\nlight_lux_by_day = { 0 = 30, 21 = 10 }\n");
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn test_physical_ranges_default_clean() {
        let (errors, _) = validate_physical_ranges(&super::super::FarmConfig::default());
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_physical_ranges_reject_bad_contamination() {
        let mut config = super::super::FarmConfig::default();
        config.anomaly.contamination = 0.9;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("contamination")));
    }
}
