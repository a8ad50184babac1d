//! Vehicle identity and battery metadata.

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

/// Battery cell chemistry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BatteryChemistry {
    /// Nickel Manganese Cobalt
    #[default]
    Nmc,
    /// Lithium Iron Phosphate
    Lfp,
}

impl BatteryChemistry {
    /// Parse a chemistry tag, case-insensitively.
    ///
    /// Unknown tags fall back to NMC instead of erroring: upstream
    /// fleets report chemistries we carry no coefficients for, and the
    /// NMC curve is the conservative estimate for those.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_lowercase().as_str() {
            "nmc" => BatteryChemistry::Nmc,
            "lfp" => BatteryChemistry::Lfp,
            other => {
                warn!(chemistry = other, "unknown battery chemistry, assuming NMC");
                BatteryChemistry::Nmc
            }
        }
    }
}

impl std::str::FromStr for BatteryChemistry {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(BatteryChemistry::from_tag(s))
    }
}

impl std::fmt::Display for BatteryChemistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatteryChemistry::Nmc => write!(f, "NMC"),
            BatteryChemistry::Lfp => write!(f, "LFP"),
        }
    }
}

impl<'de> Deserialize<'de> for BatteryChemistry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(BatteryChemistry::from_tag(&tag))
    }
}

/// Vehicle profile supplied by the caller
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VehicleProfile {
    /// Stable vehicle identifier; required for passport issuance
    pub vehicle_id: Option<Uuid>,
    /// Vehicle identification number
    pub vin: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    /// First registration year
    pub first_registration_year: Option<i32>,
    /// Battery cell chemistry
    #[serde(default)]
    pub battery_chemistry: BatteryChemistry,
    /// Rated capacity when new (kWh)
    #[validate(range(exclusive_min = 0.0))]
    pub original_capacity_kwh: f64,
    /// Vehicle age (years)
    #[validate(range(min = 0.0))]
    pub age_years: f64,
    /// Odometer reading (km)
    pub mileage_km: Option<u32>,
}

impl VehicleProfile {
    /// Minimal profile for analysis; identity fields stay empty.
    pub fn new(
        battery_chemistry: BatteryChemistry,
        original_capacity_kwh: f64,
        age_years: f64,
    ) -> Self {
        Self {
            vehicle_id: None,
            vin: None,
            make: None,
            model: None,
            first_registration_year: None,
            battery_chemistry,
            original_capacity_kwh,
            age_years,
            mileage_km: None,
        }
    }
}
