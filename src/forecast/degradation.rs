//! # Degradation Forecaster
//!
//! Projects a computed SoH forward in time. When historical SoH
//! observations exist the rate comes from a least-squares trend fit;
//! otherwise from the empirical chemistry model (calendar fade plus
//! mileage-derived cycle fade with a fast-charge penalty).
//!
//! The monetary model here (residual value at 150 CHF per kWh of usable
//! capacity) is deliberately distinct from the analyzer's value-impact
//! penalty; the two answer different questions and are kept separate.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::AnalysisError;
use crate::clock::{Clock, SystemClock};
use crate::domain::{BatteryChemistry, DegradationPrediction, ProjectionPoint, SohObservation};
use crate::util::{round1, round2};

/// Annual driving distance assumed when the caller supplies none (km)
pub const DEFAULT_ANNUAL_MILEAGE_KM: u32 = 12_000;
/// Fast-charge share assumed when none is known
pub const DEFAULT_FAST_CHARGE_RATIO: f64 = 0.2;

/// Assumed driving efficiency (km per kWh)
const KM_PER_KWH: f64 = 4.0;
/// Residual battery value (CHF per kWh of usable capacity)
const VALUE_PER_KWH_CHF: f64 = 150.0;
/// Plausibility bounds for a fitted annual rate (percent per year)
const MIN_FITTED_RATE_PCT: f64 = 0.5;
const MAX_FITTED_RATE_PCT: f64 = 5.0;
/// Warranty threshold (percent SoH)
const WARRANTY_SOH: f64 = 80.0;
/// Replacement threshold (percent SoH)
const REPLACEMENT_SOH: f64 = 70.0;

/// Inputs for one degradation forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionInput {
    /// Current State of Health (percent, 0-100)
    pub current_soh: f64,
    /// Vehicle age in years. Informational; both rate models derive
    /// their trend from history or mileage instead.
    pub age_years: f64,
    /// Historical SoH measurements, if any
    pub history: Option<Vec<SohObservation>>,
    /// Expected annual mileage (km)
    pub annual_mileage_km: Option<u32>,
    /// Share of fast charging (0-1)
    #[serde(default = "default_fast_charge_ratio")]
    pub fast_charge_ratio: f64,
}

fn default_fast_charge_ratio() -> f64 {
    DEFAULT_FAST_CHARGE_RATIO
}

impl PredictionInput {
    /// Input with no history and the default usage assumptions.
    pub fn new(current_soh: f64, age_years: f64) -> Self {
        Self {
            current_soh,
            age_years,
            history: None,
            annual_mileage_km: None,
            fast_charge_ratio: DEFAULT_FAST_CHARGE_RATIO,
        }
    }
}

/// Battery degradation forecaster
pub struct DegradationForecaster<C: Clock = SystemClock> {
    chemistry: BatteryChemistry,
    original_capacity_kwh: f64,
    clock: C,
}

impl DegradationForecaster<SystemClock> {
    pub fn new(
        chemistry: BatteryChemistry,
        original_capacity_kwh: f64,
    ) -> Result<Self, AnalysisError> {
        Self::with_clock(chemistry, original_capacity_kwh, SystemClock)
    }
}

impl<C: Clock> DegradationForecaster<C> {
    /// Forecaster reading "now" from the given clock
    pub fn with_clock(
        chemistry: BatteryChemistry,
        original_capacity_kwh: f64,
        clock: C,
    ) -> Result<Self, AnalysisError> {
        if !original_capacity_kwh.is_finite() || original_capacity_kwh <= 0.0 {
            return Err(AnalysisError::InvalidCapacity(original_capacity_kwh));
        }
        Ok(Self {
            chemistry,
            original_capacity_kwh,
            clock,
        })
    }

    /// Project SoH forward and derive threshold years, replacement
    /// year and residual value.
    pub fn predict(&self, input: &PredictionInput) -> DegradationPrediction {
        let (annual_rate, confidence) = match input.history.as_deref() {
            Some(history) if history.len() >= 2 => {
                let rate = self.rate_from_history(history);
                let confidence = (0.5 + 0.1 * history.len() as f64).min(0.9);
                (rate, confidence)
            }
            _ => {
                let mileage = input
                    .annual_mileage_km
                    .unwrap_or(DEFAULT_ANNUAL_MILEAGE_KM);
                let rate = self.empirical_rate(mileage, input.fast_charge_ratio);
                (rate, 0.6)
            }
        };

        let project = |years: f64| round1((input.current_soh - annual_rate * years).max(0.0));

        let years_to_80 = years_to_threshold(input.current_soh, WARRANTY_SOH, annual_rate);
        let years_to_70 = years_to_threshold(input.current_soh, REPLACEMENT_SOH, annual_rate);

        let remaining_capacity = self.original_capacity_kwh * input.current_soh / 100.0;
        let remaining_value = (remaining_capacity * VALUE_PER_KWH_CHF).round();

        let current_year = self.clock.now().year();
        let optimal_replacement_year =
            years_to_70.map(|years| (current_year as f64 + years).floor() as i32);

        debug!(
            rate = annual_rate,
            confidence,
            from_history = input.history.as_ref().is_some_and(|h| h.len() >= 2),
            "degradation forecast"
        );

        DegradationPrediction {
            current_soh: round1(input.current_soh),
            predicted_soh_1year: project(1.0),
            predicted_soh_2year: project(2.0),
            predicted_soh_3year: project(3.0),
            predicted_soh_5year: project(5.0),
            years_to_80_percent: years_to_80.map(round1),
            years_to_70_percent: years_to_70.map(round1),
            annual_degradation_rate: round2(annual_rate),
            confidence: round2(confidence),
            optimal_replacement_year,
            estimated_remaining_value_chf: remaining_value,
        }
    }

    /// SoH projection curve for visualization, one point per calendar
    /// year starting from the current one. Uses the empirical rate
    /// with the default usage assumptions.
    pub fn projection_curve(&self, current_soh: f64, years_ahead: u32) -> Vec<ProjectionPoint> {
        let annual_rate = self.empirical_rate(DEFAULT_ANNUAL_MILEAGE_KM, DEFAULT_FAST_CHARGE_RATIO);
        let start_year = self.clock.now().year();

        (0..=years_ahead)
            .map(|i| ProjectionPoint {
                year: start_year + i as i32,
                soh_percent: round1((current_soh - annual_rate * i as f64).max(0.0)),
            })
            .collect()
    }

    /// Least-squares slope of SoH against elapsed years (the first
    /// observation in date order is the time origin). The annual rate
    /// is the negated slope, clamped to a plausible range so a wild
    /// fit from noisy measurements cannot dominate the projection.
    fn rate_from_history(&self, history: &[SohObservation]) -> f64 {
        let mut ordered: Vec<&SohObservation> = history.iter().collect();
        ordered.sort_by_key(|obs| obs.date);

        let origin = ordered[0].date;
        let n = ordered.len() as f64;

        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut sum_xy = 0.0;
        let mut sum_x2 = 0.0;
        for obs in &ordered {
            let x = (obs.date - origin).num_days() as f64 / 365.25;
            let y = obs.soh_percent;
            sum_x += x;
            sum_y += y;
            sum_xy += x * y;
            sum_x2 += x * x;
        }

        let denominator = n * sum_x2 - sum_x * sum_x;
        let slope = (n * sum_xy - sum_x * sum_y) / denominator;
        let annual_rate = if slope.is_finite() { -slope } else { 0.0 };

        let clamped = annual_rate.clamp(MIN_FITTED_RATE_PCT, MAX_FITTED_RATE_PCT);
        if clamped != annual_rate {
            debug!(
                fitted = annual_rate,
                clamped, "trend fit outside plausible range"
            );
        }
        clamped
    }

    /// Empirical rate in percent per year: calendar fade plus cycle
    /// fade derived from mileage at 4 km/kWh, scaled by a fast-charge
    /// penalty multiplier.
    fn empirical_rate(&self, annual_mileage_km: u32, fast_charge_ratio: f64) -> f64 {
        let params = self.chemistry.params();

        let annual_kwh = annual_mileage_km as f64 / KM_PER_KWH;
        let annual_cycles = annual_kwh / self.original_capacity_kwh;

        let fast_charge_penalty = 1.0 + fast_charge_ratio * 0.5;
        let cycle_pct = annual_cycles * params.forecast_cycle_pct * fast_charge_penalty;

        params.forecast_calendar_pct + cycle_pct
    }
}

/// Years until SoH reaches `threshold` at `annual_rate` percent per
/// year: exactly 0 when already at or below the threshold, `None` when
/// the rate is non-positive.
pub fn years_to_threshold(current_soh: f64, threshold: f64, annual_rate: f64) -> Option<f64> {
    if current_soh <= threshold {
        return Some(0.0);
    }
    if annual_rate <= 0.0 {
        return None;
    }
    let years = (current_soh - threshold) / annual_rate;
    (years > 0.0).then_some(years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    fn forecaster(chemistry: BatteryChemistry) -> DegradationForecaster<FixedClock> {
        DegradationForecaster::with_clock(chemistry, 60.0, FixedClock(fixed_now())).unwrap()
    }

    fn observation(days_ago: i64, soh_percent: f64) -> SohObservation {
        SohObservation {
            date: fixed_now() - Duration::days(days_ago),
            soh_percent,
            mileage_km: None,
        }
    }

    #[test]
    fn test_invalid_capacity_is_rejected() {
        assert!(DegradationForecaster::new(BatteryChemistry::Nmc, 0.0).is_err());
        assert!(DegradationForecaster::new(BatteryChemistry::Nmc, -1.0).is_err());
        assert!(DegradationForecaster::new(BatteryChemistry::Nmc, f64::INFINITY).is_err());
    }

    #[test]
    fn test_empirical_rate_without_history() {
        // 15000 km/yr at 4 km/kWh over 60 kWh = 62.5 cycles;
        // 62.5 * 0.015% * (1 + 0.3*0.5) + 2.0% calendar
        let input = PredictionInput {
            current_soh: 92.0,
            age_years: 2.0,
            history: None,
            annual_mileage_km: Some(15_000),
            fast_charge_ratio: 0.3,
        };
        let prediction = forecaster(BatteryChemistry::Nmc).predict(&input);

        let expected_rate = 2.0 + 62.5 * 0.015 * 1.15;
        assert_eq!(prediction.annual_degradation_rate, round2(expected_rate));
        assert_eq!(prediction.confidence, 0.6);
        assert!(prediction.predicted_soh_1year < 92.0);
        assert!(prediction.predicted_soh_5year < prediction.predicted_soh_1year);
    }

    #[test]
    fn test_projections_never_go_negative() {
        let input = PredictionInput::new(3.0, 10.0);
        let prediction = forecaster(BatteryChemistry::Nmc).predict(&input);

        assert_eq!(prediction.predicted_soh_5year, 0.0);
        assert!(prediction.predicted_soh_1year >= 0.0);
    }

    #[test]
    fn test_rate_from_history_matches_known_slope() {
        // 2 points, exactly one year apart, 3 points lost: rate 3.0
        let history = vec![
            observation(365, 95.0),
            observation(0, 95.0 - 3.0 * 365.0 / 365.25),
        ];
        let input = PredictionInput {
            history: Some(history),
            ..PredictionInput::new(92.0, 3.0)
        };
        let prediction = forecaster(BatteryChemistry::Nmc).predict(&input);

        assert_eq!(prediction.annual_degradation_rate, 3.0);
        // 0.5 + 0.1 * 2
        assert_eq!(prediction.confidence, 0.7);
    }

    #[test]
    fn test_history_order_does_not_matter() {
        let newest_first = vec![observation(0, 90.0), observation(730, 96.0)];
        let oldest_first = vec![observation(730, 96.0), observation(0, 90.0)];

        let fc = forecaster(BatteryChemistry::Nmc);
        let a = fc.predict(&PredictionInput {
            history: Some(newest_first),
            ..PredictionInput::new(90.0, 2.0)
        });
        let b = fc.predict(&PredictionInput {
            history: Some(oldest_first),
            ..PredictionInput::new(90.0, 2.0)
        });

        assert_eq!(a.annual_degradation_rate, b.annual_degradation_rate);
    }

    #[test]
    fn test_implausible_fits_are_clamped() {
        // improving SoH fits a negative rate; clamp pulls it to 0.5
        let improving = vec![observation(365, 90.0), observation(0, 94.0)];
        let input = PredictionInput {
            history: Some(improving),
            ..PredictionInput::new(94.0, 4.0)
        };
        let prediction = forecaster(BatteryChemistry::Nmc).predict(&input);
        assert_eq!(prediction.annual_degradation_rate, 0.5);

        // collapsing SoH clamps to 5.0
        let collapsing = vec![observation(365, 95.0), observation(0, 60.0)];
        let input = PredictionInput {
            history: Some(collapsing),
            ..PredictionInput::new(60.0, 4.0)
        };
        let prediction = forecaster(BatteryChemistry::Nmc).predict(&input);
        assert_eq!(prediction.annual_degradation_rate, 5.0);
    }

    #[test]
    fn test_same_day_history_degenerates_to_minimum_rate() {
        let same_day = vec![observation(0, 95.0), observation(0, 93.0)];
        let input = PredictionInput {
            history: Some(same_day),
            ..PredictionInput::new(93.0, 1.0)
        };
        let prediction = forecaster(BatteryChemistry::Nmc).predict(&input);

        assert_eq!(prediction.annual_degradation_rate, MIN_FITTED_RATE_PCT);
    }

    #[test]
    fn test_history_confidence_saturates_at_0_9() {
        let history: Vec<SohObservation> = (0..10)
            .map(|i| observation(i * 90, 96.0 - i as f64 * 0.5))
            .collect();
        let input = PredictionInput {
            history: Some(history),
            ..PredictionInput::new(91.5, 3.0)
        };
        let prediction = forecaster(BatteryChemistry::Nmc).predict(&input);

        assert_eq!(prediction.confidence, 0.9);
    }

    #[test]
    fn test_years_to_threshold_rules() {
        // already at the threshold: exactly zero
        assert_eq!(years_to_threshold(80.0, 80.0, 2.0), Some(0.0));
        assert_eq!(years_to_threshold(75.0, 80.0, 2.0), Some(0.0));
        // normal crossing
        assert_eq!(years_to_threshold(90.0, 80.0, 2.0), Some(5.0));
        // non-positive rate never crosses
        assert_eq!(years_to_threshold(90.0, 80.0, 0.0), None);
        assert_eq!(years_to_threshold(90.0, 80.0, -1.0), None);
    }

    #[test]
    fn test_replacement_year_follows_years_to_70() {
        let input = PredictionInput {
            annual_mileage_km: Some(12_000),
            ..PredictionInput::new(78.0, 6.0)
        };
        let prediction = forecaster(BatteryChemistry::Nmc).predict(&input);

        let years_to_70 = prediction.years_to_70_percent.unwrap();
        assert!(years_to_70 > 0.0);
        let expected_year = (2026.0_f64 + (78.0 - 70.0) / (2.0 + 50.0 * 0.015 * 1.1)).floor() as i32;
        assert_eq!(prediction.optimal_replacement_year, Some(expected_year));
    }

    #[test]
    fn test_remaining_value_is_capacity_times_soh_times_150() {
        let input = PredictionInput::new(80.0, 5.0);
        let prediction = forecaster(BatteryChemistry::Nmc).predict(&input);

        // 60 kWh * 0.80 * 150 CHF
        assert_eq!(prediction.estimated_remaining_value_chf, 7200.0);
    }

    #[test]
    fn test_lfp_projects_slower_decline_than_nmc() {
        let input = PredictionInput::new(92.0, 3.0);
        let nmc = forecaster(BatteryChemistry::Nmc).predict(&input);
        let lfp = forecaster(BatteryChemistry::Lfp).predict(&input);

        assert!(lfp.annual_degradation_rate < nmc.annual_degradation_rate);
        assert!(lfp.predicted_soh_5year > nmc.predicted_soh_5year);
    }

    #[test]
    fn test_projection_curve_starts_now_and_declines() {
        let curve = forecaster(BatteryChemistry::Nmc).projection_curve(92.0, 10);

        assert_eq!(curve.len(), 11);
        assert_eq!(curve[0].year, 2026);
        assert_eq!(curve[0].soh_percent, 92.0);
        assert_eq!(curve[10].year, 2036);
        for pair in curve.windows(2) {
            assert!(pair[1].soh_percent <= pair[0].soh_percent);
        }
    }
}
