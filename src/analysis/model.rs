//! # Chemistry Degradation Model
//!
//! Additive capacity-fade model parameterized per cell chemistry.
//! Each chemistry maps to a fixed coefficient record selected through
//! [`BatteryChemistry::params`]; the coefficients are part of the model,
//! not configuration.
//!
//! ## Terms
//!
//! Four additive contributions, each a dimensionless fraction of
//! original capacity:
//!
//! - **Calendar**: elapsed time alone
//! - **Fast charge**: scaled by the share of high-power sessions
//! - **Temperature**: per 10 °C above the 25 °C reference; heat
//!   penalizes, cold earns no credit
//! - **Deep discharge**: share of sessions starting below 15% SOC,
//!   capped at 2 percentage points
//!
//! The summed total is clamped to [0, 1] before it becomes a SoH.

use crate::domain::BatteryChemistry;

/// Temperature above which charging stresses the cells (°C)
pub const REFERENCE_TEMP_C: f64 = 25.0;
/// Assumed temperature when no session reports one (°C)
pub const DEFAULT_AMBIENT_TEMP_C: f64 = 20.0;
/// SOC below which a session counts as a deep discharge
pub const DEEP_DISCHARGE_SOC: f64 = 0.15;
/// Ceiling on the deep-discharge contribution (fraction of capacity)
pub const DEEP_DISCHARGE_CAP: f64 = 0.02;

/// Degradation coefficients for one cell chemistry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChemistryParams {
    /// Calendar fade (fraction of capacity per year)
    pub calendar_rate: f64,
    /// Added fade at 100% fast-charge share (fraction per year)
    pub fast_charge_rate: f64,
    /// Added fade per 10 °C above reference (fraction per year)
    pub temp_rate: f64,
    /// Forecast calendar fade (percent per year)
    pub forecast_calendar_pct: f64,
    /// Forecast cycle fade (percent per equivalent full cycle)
    pub forecast_cycle_pct: f64,
}

/// NMC cells (most long-range EV packs)
const NMC_PARAMS: ChemistryParams = ChemistryParams {
    calendar_rate: 0.025,
    fast_charge_rate: 0.008,
    temp_rate: 0.003,
    forecast_calendar_pct: 2.0,
    forecast_cycle_pct: 0.015,
};

/// LFP cells degrade slower on every axis
const LFP_PARAMS: ChemistryParams = ChemistryParams {
    calendar_rate: 0.015,
    fast_charge_rate: 0.004,
    temp_rate: 0.002,
    forecast_calendar_pct: 1.5,
    forecast_cycle_pct: 0.01,
};

impl BatteryChemistry {
    /// Coefficient record for this chemistry
    pub fn params(&self) -> &'static ChemistryParams {
        match self {
            BatteryChemistry::Nmc => &NMC_PARAMS,
            BatteryChemistry::Lfp => &LFP_PARAMS,
        }
    }
}

/// Individual degradation contributions (fractions of capacity)
#[derive(Debug, Clone, Copy, Default)]
pub struct DegradationTerms {
    pub calendar: f64,
    pub fast_charge: f64,
    pub temperature: f64,
    pub deep_discharge: f64,
}

impl DegradationTerms {
    /// Evaluate the model for one vehicle's aggregated usage.
    ///
    /// `fast_charge_ratio` and `deep_discharge_ratio` are session
    /// shares in [0, 1]; `avg_temp_c` is the mean session temperature.
    pub fn evaluate(
        params: &ChemistryParams,
        age_years: f64,
        fast_charge_ratio: f64,
        avg_temp_c: f64,
        deep_discharge_ratio: f64,
    ) -> Self {
        let temp_excess = ((avg_temp_c - REFERENCE_TEMP_C) / 10.0).max(0.0);
        Self {
            calendar: params.calendar_rate * age_years,
            fast_charge: params.fast_charge_rate * fast_charge_ratio * age_years,
            temperature: params.temp_rate * temp_excess * age_years,
            deep_discharge: deep_discharge_ratio * DEEP_DISCHARGE_CAP,
        }
    }

    /// Sum of all terms, clamped to [0, 1]
    pub fn total(&self) -> f64 {
        (self.calendar + self.fast_charge + self.temperature + self.deep_discharge)
            .clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lfp_degrades_slower_than_nmc_on_every_axis() {
        let nmc = BatteryChemistry::Nmc.params();
        let lfp = BatteryChemistry::Lfp.params();

        assert!(lfp.calendar_rate < nmc.calendar_rate);
        assert!(lfp.fast_charge_rate < nmc.fast_charge_rate);
        assert!(lfp.temp_rate < nmc.temp_rate);
        assert!(lfp.forecast_calendar_pct < nmc.forecast_calendar_pct);
        assert!(lfp.forecast_cycle_pct < nmc.forecast_cycle_pct);
    }

    #[test]
    fn test_calendar_term_scales_with_age() {
        let params = BatteryChemistry::Nmc.params();
        let terms = DegradationTerms::evaluate(params, 4.0, 0.0, 20.0, 0.0);

        assert!((terms.calendar - 0.1).abs() < 1e-12);
        assert_eq!(terms.fast_charge, 0.0);
        assert_eq!(terms.temperature, 0.0);
        assert_eq!(terms.deep_discharge, 0.0);
    }

    #[test]
    fn test_cold_temperatures_earn_no_credit() {
        let params = BatteryChemistry::Nmc.params();
        let cold = DegradationTerms::evaluate(params, 2.0, 0.0, -10.0, 0.0);
        let reference = DegradationTerms::evaluate(params, 2.0, 0.0, REFERENCE_TEMP_C, 0.0);

        assert_eq!(cold.temperature, 0.0);
        assert_eq!(reference.temperature, 0.0);
        assert_eq!(cold.total(), reference.total());
    }

    #[test]
    fn test_hot_temperatures_penalize() {
        let params = BatteryChemistry::Nmc.params();
        let hot = DegradationTerms::evaluate(params, 2.0, 0.0, 35.0, 0.0);

        // (35 - 25) / 10 = 1 excess unit over two years
        assert!((hot.temperature - 0.003 * 1.0 * 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_deep_discharge_contribution_is_capped() {
        let params = BatteryChemistry::Nmc.params();
        let all_deep = DegradationTerms::evaluate(params, 0.0, 0.0, 20.0, 1.0);

        assert!((all_deep.deep_discharge - DEEP_DISCHARGE_CAP).abs() < 1e-12);
        assert!(all_deep.deep_discharge <= DEEP_DISCHARGE_CAP);
    }

    #[test]
    fn test_total_is_clamped_to_unit_interval() {
        let params = BatteryChemistry::Nmc.params();
        let extreme = DegradationTerms::evaluate(params, 80.0, 1.0, 60.0, 1.0);

        assert_eq!(extreme.total(), 1.0);
    }
}
