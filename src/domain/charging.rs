//! Charging session records.
//!
//! Normalized representation of one charge event, as handed over by the
//! surrounding ingestion layer. Range checks live on the boundary
//! (`validator` derive); the analysis core consumes records as-is and
//! tolerates malformed ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Charger power above which a session counts as fast charging (kW)
pub const FAST_CHARGE_POWER_KW: f64 = 50.0;

/// One normalized charging session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ChargingRecord {
    /// When the session occurred
    pub timestamp: DateTime<Utc>,
    /// State of charge at plug-in (fraction, 0-1)
    #[validate(range(min = 0.0, max = 1.0))]
    pub start_soc: f64,
    /// State of charge at unplug (fraction, 0-1)
    #[validate(range(min = 0.0, max = 1.0))]
    pub end_soc: f64,
    /// Energy delivered (kWh)
    #[validate(range(exclusive_min = 0.0))]
    pub energy_kwh: f64,
    /// Session length (minutes)
    #[validate(range(exclusive_min = 0.0))]
    pub duration_minutes: f64,
    /// Nominal charger rating (kW)
    #[validate(range(exclusive_min = 0.0))]
    pub charger_power_kw: f64,
    /// Ambient/battery temperature during the session (°C)
    pub temperature_c: Option<f64>,
    /// Fast-charge flag reported by the charger
    #[serde(default)]
    pub is_fast_charge: bool,
}

impl ChargingRecord {
    /// Charge depth of this session.
    ///
    /// Negative when `end_soc < start_soc`. Upstream data does contain
    /// such sessions; they are tolerated here and simply lower the
    /// average depth rather than being repaired.
    pub fn soc_delta(&self) -> f64 {
        self.end_soc - self.start_soc
    }

    /// Fast-charge classification: the charger's own flag OR a rated
    /// power above [`FAST_CHARGE_POWER_KW`].
    pub fn is_fast(&self) -> bool {
        self.is_fast_charge || self.charger_power_kw > FAST_CHARGE_POWER_KW
    }
}
