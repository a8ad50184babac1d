use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::domain::BatteryChemistry;
use crate::forecast::{DEFAULT_ANNUAL_MILEAGE_KM, DEFAULT_FAST_CHARGE_RATIO};
use crate::simulation::UsageProfile;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub forecast: ForecastConfig,
    pub demo: DemoConfig,
}

/// Service-level forecast knobs. The chemistry coefficient table is
/// part of the model, not configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Annual mileage assumed when a request carries none (km)
    pub default_annual_mileage_km: u32,
    /// Fast-charge share assumed when none is known (0-1)
    pub default_fast_charge_ratio: f64,
    /// Horizon of the projection curve (years)
    pub projection_years: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_annual_mileage_km: DEFAULT_ANNUAL_MILEAGE_KM,
            default_fast_charge_ratio: DEFAULT_FAST_CHARGE_RATIO,
            projection_years: 10,
        }
    }
}

/// Settings for the `demo` subcommand's synthetic fleet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    pub session_count: usize,
    pub profile: UsageProfile,
    pub battery_capacity_kwh: f64,
    pub vehicle_age_years: f64,
    pub chemistry: BatteryChemistry,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            session_count: 60,
            profile: UsageProfile::Mixed,
            battery_capacity_kwh: 60.0,
            vehicle_age_years: 3.0,
            chemistry: BatteryChemistry::Nmc,
        }
    }
}

impl Config {
    /// Built-in defaults, overridden by `config/default.toml` when
    /// present, overridden in turn by `PASSPORT__`-prefixed env vars.
    pub fn load() -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("PASSPORT__").split("__"));
        Ok(figment.extract()?)
    }
}
