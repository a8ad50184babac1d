//! # Battery Health Analyzer
//!
//! Turns a vehicle's charging history into a [`HealthReport`]: SoH
//! estimate, confidence score, grade, usage statistics, monetary value
//! impact and diagnostic notes.
//!
//! ## Method
//!
//! 1. Aggregate the session list in a single pass (fast-charge share,
//!    mean depth, mean temperature, cycle estimate).
//! 2. Apply the additive chemistry model and clamp the total.
//! 3. Blend a confidence score from data volume, recency and span.
//! 4. Classify the grade and derive recommendations / risk factors.
//!
//! Every call is a pure function of its inputs and the injected clock;
//! concurrent calls share nothing. Empty histories are a normal case
//! and produce a low-confidence calendar-only estimate, never an error.

use thiserror::Error;
use tracing::debug;

use chrono::{DateTime, Utc};
use itertools::{Itertools, MinMaxResult};

use crate::analysis::model::{DegradationTerms, DEEP_DISCHARGE_SOC, DEFAULT_AMBIENT_TEMP_C};
use crate::clock::{Clock, SystemClock};
use crate::domain::{BatteryChemistry, ChargingRecord, HealthGrade, HealthReport, VehicleProfile};
use crate::util::{round1, round2};

/// Analysis errors. Only configuration bugs surface here; data-quality
/// problems degrade the report instead of failing it.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid battery capacity: {0} kWh (must be positive and finite)")]
    InvalidCapacity(f64),
}

/// Value lost per SoH point below the no-penalty threshold (CHF)
const CHF_PER_SOH_POINT: f64 = 150.0;
/// SoH at or above which resale value carries no penalty (%)
const NO_PENALTY_SOH: f64 = 90.0;
/// Record count at which the data-volume score saturates
const FULL_DATA_RECORD_COUNT: f64 = 50.0;
/// Days after which the recency score reaches zero
const RECENCY_WINDOW_DAYS: f64 = 180.0;
/// Span score assigned when fewer than two records exist
const SPARSE_SPAN_SCORE: f64 = 0.3;
/// Confidence reported when no charging data exists at all
const NO_DATA_CONFIDENCE: f64 = 0.3;
/// Age floor keeping the annualized rate finite for new vehicles (years)
const MIN_RATE_AGE_YEARS: f64 = 0.5;

/// Aggregated usage statistics over a charging history
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageStats {
    /// Share of sessions classified as fast charging (0-1)
    pub fast_charge_ratio: f64,
    /// Mean SOC delta per session (negative deltas tolerated)
    pub avg_charge_depth: f64,
    /// Mean reported session temperature (°C)
    pub avg_temperature_c: f64,
    /// Share of sessions starting below the deep-discharge SOC (0-1)
    pub deep_discharge_ratio: f64,
    /// Cumulative energy delivered (kWh)
    pub total_energy_kwh: f64,
    /// Equivalent full cycles
    pub cycle_count: u32,
}

impl UsageStats {
    /// Single-pass aggregation over a session list.
    pub fn collect(records: &[ChargingRecord], capacity_kwh: f64) -> Self {
        if records.is_empty() {
            return Self {
                avg_temperature_c: DEFAULT_AMBIENT_TEMP_C,
                ..Self::default()
            };
        }

        let mut fast_count = 0usize;
        let mut deep_count = 0usize;
        let mut depth_sum = 0.0;
        let mut temp_sum = 0.0;
        let mut temp_count = 0usize;
        let mut total_energy = 0.0;

        for record in records {
            if record.is_fast() {
                fast_count += 1;
            }
            if record.start_soc < DEEP_DISCHARGE_SOC {
                deep_count += 1;
            }
            depth_sum += record.soc_delta();
            if let Some(temp) = record.temperature_c {
                temp_sum += temp;
                temp_count += 1;
            }
            total_energy += record.energy_kwh;
        }

        let n = records.len() as f64;
        Self {
            fast_charge_ratio: fast_count as f64 / n,
            avg_charge_depth: depth_sum / n,
            avg_temperature_c: if temp_count > 0 {
                temp_sum / temp_count as f64
            } else {
                DEFAULT_AMBIENT_TEMP_C
            },
            deep_discharge_ratio: deep_count as f64 / n,
            total_energy_kwh: total_energy,
            cycle_count: (total_energy / capacity_kwh).floor().max(0.0) as u32,
        }
    }
}

/// Battery health analyzer
pub struct SohAnalyzer<C: Clock = SystemClock> {
    clock: C,
}

impl SohAnalyzer<SystemClock> {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl Default for SohAnalyzer<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SohAnalyzer<C> {
    /// Analyzer reading "now" from the given clock
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Analyze a charging history against a vehicle profile.
    ///
    /// The only error is a non-positive or non-finite capacity, which
    /// is a caller configuration bug. Empty histories and malformed
    /// records are handled, not rejected.
    pub fn analyze(
        &self,
        records: &[ChargingRecord],
        profile: &VehicleProfile,
    ) -> Result<HealthReport, AnalysisError> {
        let capacity = profile.original_capacity_kwh;
        if !capacity.is_finite() || capacity <= 0.0 {
            return Err(AnalysisError::InvalidCapacity(capacity));
        }

        if records.is_empty() {
            debug!(
                age_years = profile.age_years,
                chemistry = %profile.battery_chemistry,
                "no charging data, falling back to calendar-only estimate"
            );
            return Ok(self.empty_report(profile));
        }

        let stats = UsageStats::collect(records, capacity);
        let params = profile.battery_chemistry.params();
        let terms = DegradationTerms::evaluate(
            params,
            profile.age_years,
            stats.fast_charge_ratio,
            stats.avg_temperature_c,
            stats.deep_discharge_ratio,
        );
        let total = terms.total();

        let now = self.clock.now();
        let soh_percent = round1((100.0 - total * 100.0).clamp(0.0, 100.0));
        let rate_pct_per_year = round2(total / profile.age_years.max(MIN_RATE_AGE_YEARS) * 100.0);
        let confidence = round2(self.confidence(records, profile.age_years, now));
        let health_grade = HealthGrade::from_soh(soh_percent);

        let value_impact_chf = (soh_percent < NO_PENALTY_SOH)
            .then(|| -(NO_PENALTY_SOH - soh_percent) * CHF_PER_SOH_POINT);

        let report = HealthReport {
            soh_percent,
            soh_confidence: confidence,
            estimated_capacity_kwh: capacity * soh_percent / 100.0,
            health_grade,
            fast_charge_ratio: round1(stats.fast_charge_ratio * 100.0),
            avg_charge_depth: round1(stats.avg_charge_depth * 100.0),
            cycle_count_estimate: stats.cycle_count,
            total_energy_kwh: round1(stats.total_energy_kwh),
            degradation_rate_per_year: rate_pct_per_year,
            value_impact_chf,
            risk_factors: risk_factors(soh_percent, rate_pct_per_year, profile.age_years, &stats),
            recommendations: recommendations(soh_percent, &stats, profile.battery_chemistry),
            analyzed_at: now,
        };

        debug!(
            soh = report.soh_percent,
            grade = %report.health_grade,
            confidence = report.soh_confidence,
            sessions = records.len(),
            "analysis complete"
        );
        Ok(report)
    }

    /// Calendar-only estimate for vehicles without any charging data.
    fn empty_report(&self, profile: &VehicleProfile) -> HealthReport {
        let params = profile.battery_chemistry.params();
        let soh_percent = round1(
            (100.0 - params.calendar_rate * profile.age_years * 100.0).clamp(0.0, 100.0),
        );

        HealthReport {
            soh_percent,
            soh_confidence: NO_DATA_CONFIDENCE,
            estimated_capacity_kwh: profile.original_capacity_kwh * soh_percent / 100.0,
            health_grade: HealthGrade::from_soh(soh_percent),
            fast_charge_ratio: 0.0,
            avg_charge_depth: 0.0,
            cycle_count_estimate: 0,
            total_energy_kwh: 0.0,
            degradation_rate_per_year: params.calendar_rate * 100.0,
            value_impact_chf: None,
            risk_factors: vec!["Insufficient data for detailed assessment".to_string()],
            recommendations: vec!["Upload charging data for accurate analysis".to_string()],
            analyzed_at: self.clock.now(),
        }
    }

    /// Weighted blend of data volume (0.4), recency (0.3) and span
    /// relative to vehicle age (0.3), each a [0, 1] sub-score.
    fn confidence(&self, records: &[ChargingRecord], age_years: f64, now: DateTime<Utc>) -> f64 {
        if records.is_empty() {
            return NO_DATA_CONFIDENCE;
        }

        let data_score = (records.len() as f64 / FULL_DATA_RECORD_COUNT).min(1.0);

        let (earliest, latest) = match records.iter().map(|r| r.timestamp).minmax() {
            MinMaxResult::MinMax(first, last) => (first, last),
            MinMaxResult::OneElement(only) => (only, only),
            MinMaxResult::NoElements => (now, now),
        };

        let days_old = (now - latest).num_days() as f64;
        let recency_score = (1.0 - days_old / RECENCY_WINDOW_DAYS).clamp(0.0, 1.0);

        let span_score = if records.len() >= 2 {
            let span_days = (latest - earliest).num_days() as f64;
            (span_days / (age_years * 365.0 + 30.0)).min(1.0)
        } else {
            SPARSE_SPAN_SCORE
        };

        data_score * 0.4 + recency_score * 0.3 + span_score * 0.3
    }
}

/// Charging-habit recommendations, in fixed rule order. Emits exactly
/// one all-clear line when nothing fires.
fn recommendations(
    soh_percent: f64,
    stats: &UsageStats,
    chemistry: BatteryChemistry,
) -> Vec<String> {
    let mut recs = Vec::new();

    if stats.fast_charge_ratio > 0.3 {
        recs.push("Reduce fast charging frequency to extend battery life".to_string());
    }
    if stats.avg_charge_depth > 0.7 {
        recs.push("Consider partial charges (20-80%) instead of full cycles".to_string());
    }
    if stats.avg_temperature_c > 30.0 {
        recs.push("Avoid charging in high temperatures when possible".to_string());
    }
    if soh_percent < 80.0 {
        recs.push("Consider battery health check at authorized service center".to_string());
    }
    if chemistry == BatteryChemistry::Lfp && stats.avg_charge_depth < 0.5 {
        recs.push("LFP batteries benefit from occasional full charges for calibration".to_string());
    }

    if recs.is_empty() {
        recs.push("Battery health is good - continue current charging habits".to_string());
    }

    recs
}

/// Risk factors, in fixed rule order; may be empty.
fn risk_factors(
    soh_percent: f64,
    rate_pct_per_year: f64,
    age_years: f64,
    stats: &UsageStats,
) -> Vec<String> {
    let mut risks = Vec::new();

    if soh_percent < 70.0 {
        risks.push("Battery may need replacement within 1-2 years".to_string());
    }
    if stats.fast_charge_ratio > 0.5 {
        risks.push("High fast-charging usage accelerating degradation".to_string());
    }
    if stats.avg_temperature_c > 35.0 {
        risks.push("Elevated charging temperatures detected".to_string());
    }
    if rate_pct_per_year > 4.0 {
        risks.push("Above-average degradation rate".to_string());
    }
    if age_years > 8.0 && soh_percent < 80.0 {
        risks.push("Warranty coverage may have expired".to_string());
    }

    risks
}
