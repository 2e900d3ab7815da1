//! Config Validation Tests
//!
//! Exercises file loading, typo detection and range validation of the
//! farm configuration independently from the HTTP surface.

use std::io::Write;

use flocksense::config::validation::{
    known_config_keys, suggest_correction, validate_physical_ranges, validate_unknown_keys,
};
use flocksense::config::{ConfigError, FarmConfig};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_recommendations_section_warns_with_suggestion() {
    let toml_str = r#"
[recommendations]
window_sampels = 48
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert_eq!(warnings[0].field, "recommendations.window_sampels");
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("recommendations.window_samples"),
        "Should suggest the correct spelling"
    );
}

#[test]
fn unknown_section_warns_without_close_match() {
    let toml_str = r#"
[lighting_program]
hours_dark = 6
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(!warnings.is_empty());
    assert!(warnings.iter().all(|w| w.field.starts_with("lighting_program")));
}

#[test]
fn curve_tables_accept_arbitrary_day_keys() {
    let toml_str = r#"
[targets.temperature_c_by_day]
0 = 33.0
14 = 27.5
42 = 20.0
"#;
    assert!(validate_unknown_keys(toml_str).is_empty());
}

#[test]
fn known_keys_drive_suggestions() {
    let known = known_config_keys();
    assert!(known.contains("anomaly.contamination"));
    assert!(known.contains("server.addr"));
    assert_eq!(
        suggest_correction("anomaly.n_tres", &known).as_deref(),
        Some("anomaly.n_trees")
    );
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn default_config_has_no_range_errors() {
    let (errors, warnings) = validate_physical_ranges(&FarmConfig::default());
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert!(warnings.is_empty());
}

#[test]
fn uneven_interval_is_warning_not_error() {
    let mut config = FarmConfig::default();
    config.simulation.interval_minutes = 7;
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty());
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field, "simulation.interval_minutes");
}

#[test]
fn multiple_range_errors_are_collected() {
    let toml_str = r#"
[targets]
humidity_pct_target_range = [80.0, 40.0]
co2_ppm_max = -5.0

[anomaly]
n_trees = 0
"#;
    match FarmConfig::from_toml_str(toml_str) {
        Err(ConfigError::Validation(errors)) => {
            assert_eq!(errors.len(), 3, "errors: {errors:?}");
            assert!(errors.iter().any(|e| e.contains("humidity_pct_target_range")));
            assert!(errors.iter().any(|e| e.contains("co2_ppm_max")));
            assert!(errors.iter().any(|e| e.contains("n_trees")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn inverted_bird_bounds_rejected() {
    let toml_str = r#"
[simulation]
min_birds_per_house = 50000
max_birds_per_house = 10000
"#;
    assert!(matches!(
        FarmConfig::from_toml_str(toml_str),
        Err(ConfigError::Validation(_))
    ));
}

// ============================================================================
// File Loading
// ============================================================================

#[test]
fn load_from_file_applies_overrides() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[farm]
name = "Hillside Broilers"

[targets]
humidity_pct_target_range = [55.0, 65.0]

[targets.temperature_c_by_day]
0 = 33.0
35 = 20.0

[simulation]
seed = 99
start = "2024-03-01T00:00:00Z"
"#
    )
    .unwrap();

    let config = FarmConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.farm.name, "Hillside Broilers");
    assert_eq!(config.simulation.seed, 99);
    assert_eq!(config.simulation.interval_minutes, 15);

    let targets = config.target_provider().unwrap();
    assert_eq!(targets.humidity_range(), [55.0, 65.0]);
    assert!((targets.temperature_at(0.0) - 33.0).abs() < 1e-9);
    assert!((targets.temperature_at(70.0) - 20.0).abs() < 1e-9);
}

#[test]
fn load_from_file_reports_path_on_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[simulation\nseed = ").unwrap();

    match FarmConfig::load_from_file(file.path()) {
        Err(err @ ConfigError::Parse(..)) => {
            let msg = err.to_string();
            assert!(msg.contains(&file.path().display().to_string()), "{msg}");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn malformed_curve_key_is_rejected() {
    let toml_str = r#"
[targets.light_lux_by_day]
first = 30.0
"#;
    assert!(matches!(
        FarmConfig::from_toml_str(toml_str),
        Err(ConfigError::Curve(_))
    ));
}

#[test]
fn dumped_config_loads_back() {
    let mut config = FarmConfig::default();
    config.recommendations.window_samples = 48;
    let toml_str = config.to_toml().unwrap();

    let reloaded = FarmConfig::from_toml_str(&toml_str).unwrap();
    assert_eq!(reloaded.recommendations.window_samples, 48);
    assert_eq!(reloaded.storage.data_path, config.storage.data_path);
}
