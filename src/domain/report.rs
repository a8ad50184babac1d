//! Health report output types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Battery health grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthGrade {
    Excellent, // SoH >= 95
    Good,      // SoH >= 85
    Fair,      // SoH >= 75
    Poor,      // SoH >= 65
    Critical,  // below 65
}

impl HealthGrade {
    /// Classify a SoH percentage. Thresholds are inclusive lower
    /// bounds, scanned high to low.
    pub fn from_soh(soh_percent: f64) -> Self {
        if soh_percent >= 95.0 {
            HealthGrade::Excellent
        } else if soh_percent >= 85.0 {
            HealthGrade::Good
        } else if soh_percent >= 75.0 {
            HealthGrade::Fair
        } else if soh_percent >= 65.0 {
            HealthGrade::Poor
        } else {
            HealthGrade::Critical
        }
    }

    /// One-line description for certificates and summaries.
    pub fn summary(&self, soh_percent: f64) -> String {
        match self {
            HealthGrade::Excellent => {
                format!("Excellent condition ({soh_percent:.0}%). Battery performs like new.")
            }
            HealthGrade::Good => format!(
                "Good condition ({soh_percent:.0}%). Normal ageing, fully usable day to day."
            ),
            HealthGrade::Fair => format!(
                "Fair condition ({soh_percent:.0}%). Noticeable range reduction."
            ),
            HealthGrade::Poor => format!(
                "Reduced condition ({soh_percent:.0}%). Significant capacity loss."
            ),
            HealthGrade::Critical => format!(
                "Critical condition ({soh_percent:.0}%). Battery replacement recommended."
            ),
        }
    }
}

impl std::fmt::Display for HealthGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthGrade::Excellent => write!(f, "excellent"),
            HealthGrade::Good => write!(f, "good"),
            HealthGrade::Fair => write!(f, "fair"),
            HealthGrade::Poor => write!(f, "poor"),
            HealthGrade::Critical => write!(f, "critical"),
        }
    }
}

/// Battery health analysis result, immutable once produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Estimated State of Health (percent of original capacity)
    pub soh_percent: f64,
    /// Confidence in the estimate (0-1)
    pub soh_confidence: f64,
    /// Usable capacity implied by the estimate (kWh)
    pub estimated_capacity_kwh: f64,
    /// Grade classification of `soh_percent`
    pub health_grade: HealthGrade,
    /// Share of sessions classified as fast charging (percent)
    pub fast_charge_ratio: f64,
    /// Mean charge depth per session (percent)
    pub avg_charge_depth: f64,
    /// Equivalent full cycles from cumulative throughput
    pub cycle_count_estimate: u32,
    /// Cumulative energy delivered across all sessions (kWh)
    pub total_energy_kwh: f64,
    /// Annualized degradation (percent per year)
    pub degradation_rate_per_year: f64,
    /// Resale value delta vs a pristine battery (CHF, <= 0).
    /// Absent at or above the 90% no-penalty threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_impact_chf: Option<f64>,
    /// Risk factors in fixed rule order; may be empty
    pub risk_factors: Vec<String>,
    /// Charging-habit recommendations in fixed rule order; never empty
    pub recommendations: Vec<String>,
    /// When this analysis ran
    pub analyzed_at: DateTime<Utc>,
}
