//! Degradation forecast output types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One historical SoH measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SohObservation {
    pub date: DateTime<Utc>,
    /// Measured State of Health (percent)
    pub soh_percent: f64,
    /// Odometer reading at measurement time (km)
    pub mileage_km: Option<u32>,
}

/// One point on a projection curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    /// Calendar year
    pub year: i32,
    /// Projected SoH (percent)
    pub soh_percent: f64,
}

/// Future degradation projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegradationPrediction {
    /// SoH at prediction time (percent)
    pub current_soh: f64,
    pub predicted_soh_1year: f64,
    pub predicted_soh_2year: f64,
    pub predicted_soh_3year: f64,
    pub predicted_soh_5year: f64,
    /// Years until the 80% warranty threshold; 0 when already below,
    /// absent when the rate is non-positive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_to_80_percent: Option<f64>,
    /// Years until the 70% replacement threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_to_70_percent: Option<f64>,
    /// Annual degradation rate (percent per year)
    pub annual_degradation_rate: f64,
    /// Confidence in the projection (0-1)
    pub confidence: f64,
    /// Calendar year in which replacement becomes due (reaches 70%)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimal_replacement_year: Option<i32>,
    /// Residual battery value (CHF)
    pub estimated_remaining_value_chf: f64,
}
