//! Broiler House Telemetry Simulation
//!
//! Generates deterministic poultry house telemetry for testing flocksense
//! without a running server. Rows go either to a CSV store file or to
//! stdout (JSON lines or CSV).
//!
//! # Usage
//! ```bash
//! ./simulation --days 7 --houses 2 --out data/simulated.csv
//! ./simulation --days 3 --houses 1 --format json --quiet | jq .temp_c
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use clap::Parser;

use flocksense::config::defaults::{
    DEFAULT_BIRDS_PER_HOUSE, DEFAULT_SIMULATION_DAYS, DEFAULT_SIMULATION_HOUSES,
};
use flocksense::config::FarmConfig;
use flocksense::kpi::compute_kpis;
use flocksense::simulator::{SimulationParams, TelemetrySimulator};
use flocksense::storage::{CsvStore, TelemetryStore};
use flocksense::types::TelemetryRecord;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "flocksense-simulation")]
#[command(about = "Broiler house telemetry simulation for flocksense testing")]
#[command(version = "1.0")]
struct Args {
    /// Simulated flock duration in days (1-60)
    #[arg(short, long, default_value_t = DEFAULT_SIMULATION_DAYS, value_parser = clap::value_parser!(u32).range(1..=60))]
    days: u32,

    /// Number of houses (1-10)
    #[arg(short = 'n', long, default_value_t = DEFAULT_SIMULATION_HOUSES, value_parser = clap::value_parser!(u32).range(1..=10))]
    houses: u32,

    /// Birds placed per house
    #[arg(short, long, default_value_t = DEFAULT_BIRDS_PER_HOUSE, value_parser = clap::value_parser!(u32).range(1_000..=60_000))]
    birds: u32,

    /// Random seed for reproducibility (default: config `[simulation] seed`)
    #[arg(long)]
    seed: Option<u64>,

    /// Sampling interval in minutes (default: config `[simulation] interval_minutes`)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=1440))]
    interval: Option<u32>,

    /// First sample timestamp, RFC 3339 (default: config `[simulation] start`)
    #[arg(long)]
    start: Option<DateTime<Utc>>,

    /// Write rows to this CSV store file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Stdout format when `--out` is not given: json or csv
    #[arg(short, long, default_value = "json")]
    format: String,

    /// Farm config file for target curves and simulation defaults
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Suppress the run log (only output telemetry)
    #[arg(short, long)]
    quiet: bool,
}

// ============================================================================
// Logging Utilities
// ============================================================================

fn format_time(seconds: f64) -> String {
    let hours = (seconds / 3600.0) as u32;
    let minutes = ((seconds % 3600.0) / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

fn log_mission(time: f64, message: &str, quiet: bool) {
    if !quiet {
        eprintln!("[{}] {}", format_time(time), message);
    }
}

// ============================================================================
// Output
// ============================================================================

fn write_stdout(records: &[TelemetryRecord], format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut stdout_lock = stdout.lock();

    match format {
        "csv" => {
            let mut writer = csv::Writer::from_writer(&mut stdout_lock);
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        _ => {
            for record in records {
                let json = serde_json::to_string(record)?;
                writeln!(stdout_lock, "{}", json)?;
            }
        }
    }

    stdout_lock.flush()?;
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Library logs go to stderr so stdout stays clean telemetry
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => FarmConfig::load_from_file(path)?,
        None => FarmConfig::default(),
    };

    let interval_minutes = args.interval.unwrap_or(config.simulation.interval_minutes);
    let seed = args.seed.unwrap_or(config.simulation.seed);
    let start = args.start.unwrap_or(config.simulation.start);

    let params = SimulationParams {
        days: args.days,
        houses: args.houses,
        birds_per_house: args.birds,
        interval_minutes,
        seed,
        start,
    };

    // Run briefing
    log_mission(0.0, &"=".repeat(70), args.quiet);
    log_mission(0.0, "BROILER HOUSE SIMULATION v1.0", args.quiet);
    log_mission(0.0, "flocksense Telemetry Generator", args.quiet);
    log_mission(0.0, &"=".repeat(70), args.quiet);
    log_mission(0.0, "", args.quiet);
    log_mission(0.0, "FLOCK PARAMETERS:", args.quiet);
    log_mission(0.0, &format!("  Farm: {}", config.farm.name), args.quiet);
    log_mission(0.0, &format!("  Houses: {}", params.houses), args.quiet);
    log_mission(0.0, &format!("  Birds per house: {}", params.birds_per_house), args.quiet);
    log_mission(0.0, "", args.quiet);
    log_mission(0.0, "SIMULATION PARAMETERS:", args.quiet);
    log_mission(0.0, &format!("  Duration: {} days ({} samples per house)", params.days, params.samples_per_house()), args.quiet);
    log_mission(0.0, &format!("  Interval: {} min", params.interval_minutes), args.quiet);
    log_mission(0.0, &format!("  Start: {}", params.start.to_rfc3339()), args.quiet);
    log_mission(0.0, &format!("  Random seed: {}", params.seed), args.quiet);
    log_mission(0.0, &"=".repeat(70), args.quiet);
    log_mission(0.0, "SIMULATION START", args.quiet);
    log_mission(0.0, &"=".repeat(70), args.quiet);

    let start_time = Instant::now();
    let simulator = TelemetrySimulator::new(config.target_provider()?);
    let records = simulator.simulate(&params);
    log_mission(start_time.elapsed().as_secs_f64(), &format!("Generated {} rows", records.len()), args.quiet);

    match &args.out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let store = CsvStore::new(path.clone());
            let written = store.replace_all(&records)?;
            log_mission(
                start_time.elapsed().as_secs_f64(),
                &format!("Wrote {} rows to {}", written, path.display()),
                args.quiet,
            );
        }
        None => write_stdout(&records, &args.format)?,
    }

    // Run debrief
    let elapsed = start_time.elapsed().as_secs_f64();
    log_mission(elapsed, &"=".repeat(70), args.quiet);
    log_mission(elapsed, "SIMULATION COMPLETE", args.quiet);
    log_mission(elapsed, &"=".repeat(70), args.quiet);
    for house in 1..=params.houses {
        let house_id = format!("H{house}");
        let house_records: Vec<TelemetryRecord> = records
            .iter()
            .filter(|r| r.house_id == house_id)
            .cloned()
            .collect();
        if let Ok(kpis) = compute_kpis(&house_id, &house_records) {
            log_mission(
                elapsed,
                &format!(
                    "{}: alive {}/{} | ADG {:.1} g/d | FCR {:.2} | EPEF {:.1}",
                    house_id, kpis.birds_alive, kpis.birds_start, kpis.adg_g_per_day, kpis.fcr_estimate, kpis.epef
                ),
                args.quiet,
            );
        }
    }
    log_mission(elapsed, &format!("Real time: {:.2}s", elapsed), args.quiet);
    log_mission(elapsed, &"=".repeat(70), args.quiet);

    Ok(())
}
