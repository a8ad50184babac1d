//! Battery Passport - CLI
//!
//! ```sh
//! # Analyze a charging history
//! battery-passport analyze --input fleet.json
//!
//! # Include the degradation forecast
//! battery-passport analyze --input fleet.json --forecast --pretty
//!
//! # Issue a certified passport
//! battery-passport passport --input fleet.json --pretty
//!
//! # Synthetic end-to-end run, reproducible with a seed
//! battery-passport demo --profile fast-heavy --seed 42
//!
//! # Check a passport someone handed you
//! battery-passport verify --passport passport.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use battery_passport::analysis::SohAnalyzer;
use battery_passport::config::Config;
use battery_passport::domain::{
    ChargingRecord, DegradationPrediction, HealthReport, SohObservation, VehicleProfile,
};
use battery_passport::forecast::{DegradationForecaster, PredictionInput};
use battery_passport::passport::{Passport, PassportIssuer};
use battery_passport::simulation::{SessionGenerator, SessionGeneratorConfig, UsageProfile};
use battery_passport::telemetry::init_tracing;

/// Analysis request: a vehicle profile plus its charging history.
#[derive(Debug, Deserialize)]
struct AnalysisInput {
    vehicle: VehicleProfile,
    #[serde(default)]
    sessions: Vec<ChargingRecord>,
    /// Historical SoH measurements for the trend fit, if any
    history: Option<Vec<SohObservation>>,
    annual_mileage_km: Option<u32>,
}

/// Battery health analysis and certified value passports for EVs.
#[derive(Parser, Debug)]
#[command(
    name = "battery-passport",
    version,
    about = "Battery health analysis and certified value passports for EVs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a charging history and print the health report
    Analyze {
        /// Path to the analysis input (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Also run the degradation forecast
        #[arg(long)]
        forecast: bool,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Analyze, forecast and issue a certified passport
    Passport {
        /// Path to the analysis input (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Generate a synthetic history and run the full pipeline
    Demo {
        /// Number of charging sessions to generate
        #[arg(long)]
        sessions: Option<usize>,

        /// Usage profile (gentle, mixed, fast-heavy)
        #[arg(long)]
        profile: Option<UsageProfile>,

        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Simulated vehicle age (years)
        #[arg(long)]
        age_years: Option<f64>,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Verify the certification hash and validity of a passport
    Verify {
        /// Path to the passport document (JSON)
        #[arg(short, long)]
        passport: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Command::Analyze {
            input,
            forecast,
            pretty,
        } => cmd_analyze(&config, &input, forecast, pretty),
        Command::Passport { input, pretty } => cmd_passport(&config, &input, pretty),
        Command::Demo {
            sessions,
            profile,
            seed,
            age_years,
            pretty,
        } => cmd_demo(&config, sessions, profile, seed, age_years, pretty),
        Command::Verify { passport } => cmd_verify(&passport),
    }
}

fn cmd_analyze(config: &Config, path: &Path, forecast: bool, pretty: bool) -> Result<()> {
    let mut input = read_input(path)?;
    let sessions = validated_sessions(std::mem::take(&mut input.sessions));

    let report = SohAnalyzer::new().analyze(&sessions, &input.vehicle)?;

    if forecast {
        let prediction = run_forecast(config, &input, &report, &sessions)?;
        print_json(&serde_json::json!({ "report": report, "prediction": prediction }), pretty)
    } else {
        print_json(&report, pretty)
    }
}

fn cmd_passport(config: &Config, path: &Path, pretty: bool) -> Result<()> {
    let mut input = read_input(path)?;
    let sessions = validated_sessions(std::mem::take(&mut input.sessions));

    let report = SohAnalyzer::new().analyze(&sessions, &input.vehicle)?;
    let prediction = run_forecast(config, &input, &report, &sessions)?;
    let passport = PassportIssuer::new().issue(&input.vehicle, &report, Some(&prediction))?;

    print_json(&passport, pretty)
}

fn cmd_demo(
    config: &Config,
    sessions: Option<usize>,
    profile: Option<UsageProfile>,
    seed: Option<u64>,
    age_years: Option<f64>,
    pretty: bool,
) -> Result<()> {
    let generator_config = SessionGeneratorConfig {
        session_count: sessions.unwrap_or(config.demo.session_count),
        profile: profile.unwrap_or(config.demo.profile),
        battery_capacity_kwh: config.demo.battery_capacity_kwh,
        random_seed: seed,
        ..Default::default()
    };
    info!(
        sessions = generator_config.session_count,
        profile = %generator_config.profile,
        "generating synthetic charging history"
    );
    let records = SessionGenerator::new(generator_config).generate(Utc::now());

    let vehicle = VehicleProfile {
        vehicle_id: Some(Uuid::new_v4()),
        ..VehicleProfile::new(
            config.demo.chemistry,
            config.demo.battery_capacity_kwh,
            age_years.unwrap_or(config.demo.vehicle_age_years),
        )
    };

    let report = SohAnalyzer::new().analyze(&records, &vehicle)?;

    let forecaster =
        DegradationForecaster::new(vehicle.battery_chemistry, vehicle.original_capacity_kwh)?;
    let prediction = forecaster.predict(&PredictionInput {
        current_soh: report.soh_percent,
        age_years: vehicle.age_years,
        history: None,
        annual_mileage_km: Some(config.forecast.default_annual_mileage_km),
        fast_charge_ratio: report.fast_charge_ratio / 100.0,
    });
    let projection =
        forecaster.projection_curve(report.soh_percent, config.forecast.projection_years);

    let passport = PassportIssuer::new().issue(&vehicle, &report, Some(&prediction))?;

    print_json(
        &serde_json::json!({
            "vehicle": vehicle,
            "report": report,
            "prediction": prediction,
            "projection": projection,
            "passport": passport,
        }),
        pretty,
    )
}

fn cmd_verify(path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading passport from {}", path.display()))?;
    let passport: Passport =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;

    PassportIssuer::new().verify(&passport)?;

    println!(
        "passport {} is authentic, valid until {}",
        passport.passport_id, passport.valid_until
    );
    Ok(())
}

fn run_forecast(
    config: &Config,
    input: &AnalysisInput,
    report: &HealthReport,
    sessions: &[ChargingRecord],
) -> Result<DegradationPrediction> {
    let forecaster = DegradationForecaster::new(
        input.vehicle.battery_chemistry,
        input.vehicle.original_capacity_kwh,
    )?;

    // the report stores the ratio as a percentage
    let fast_charge_ratio = if sessions.is_empty() {
        config.forecast.default_fast_charge_ratio
    } else {
        report.fast_charge_ratio / 100.0
    };

    Ok(forecaster.predict(&PredictionInput {
        current_soh: report.soh_percent,
        age_years: input.vehicle.age_years,
        history: input.history.clone(),
        annual_mileage_km: Some(
            input
                .annual_mileage_km
                .unwrap_or(config.forecast.default_annual_mileage_km),
        ),
        fast_charge_ratio,
    }))
}

fn read_input(path: &Path) -> Result<AnalysisInput> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading input from {}", path.display()))?;
    let input: AnalysisInput =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    input
        .vehicle
        .validate()
        .context("invalid vehicle profile")?;
    Ok(input)
}

/// Boundary validation: invalid records are logged and dropped, they
/// never reach the analysis core.
fn validated_sessions(sessions: Vec<ChargingRecord>) -> Vec<ChargingRecord> {
    let total = sessions.len();
    let valid: Vec<ChargingRecord> = sessions
        .into_iter()
        .filter(|record| match record.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!(timestamp = %record.timestamp, error = %e, "dropping invalid charging record");
                false
            }
        })
        .collect();

    if valid.len() < total {
        info!(
            kept = valid.len(),
            dropped = total - valid.len(),
            "charging history filtered"
        );
    }
    valid
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", text);
    Ok(())
}
