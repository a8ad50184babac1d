//! # Synthetic Charging History Generator
//!
//! Produces realistic charging session histories for demos and tests.
//! Sessions are spread evenly over a configurable window with random
//! jitter, and their shape (fast-charge share, charge depth, deep
//! discharges, temperatures) follows a driver usage profile.
//!
//! Seeded generators are fully deterministic, which the test suites
//! rely on.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::domain::ChargingRecord;

/// Driver usage profile shaping the generated history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsageProfile {
    /// Mostly slow AC charging, shallow cycles
    Gentle,
    /// Typical mix of home AC and occasional DC fast charging
    Mixed,
    /// Road-warrior pattern, predominantly DC fast charging
    FastHeavy,
}

/// Per-profile session shape parameters
struct ProfileParams {
    fast_probability: f64,
    depth_mean: f64,
    depth_std: f64,
    deep_discharge_probability: f64,
}

impl UsageProfile {
    fn params(&self) -> ProfileParams {
        match self {
            UsageProfile::Gentle => ProfileParams {
                fast_probability: 0.05,
                depth_mean: 0.45,
                depth_std: 0.10,
                deep_discharge_probability: 0.02,
            },
            UsageProfile::Mixed => ProfileParams {
                fast_probability: 0.25,
                depth_mean: 0.55,
                depth_std: 0.15,
                deep_discharge_probability: 0.08,
            },
            UsageProfile::FastHeavy => ProfileParams {
                fast_probability: 0.7,
                depth_mean: 0.65,
                depth_std: 0.15,
                deep_discharge_probability: 0.2,
            },
        }
    }
}

impl std::str::FromStr for UsageProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gentle" => Ok(UsageProfile::Gentle),
            "mixed" => Ok(UsageProfile::Mixed),
            "fast-heavy" => Ok(UsageProfile::FastHeavy),
            _ => Err(format!("Unknown usage profile: {}", s)),
        }
    }
}

impl std::fmt::Display for UsageProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UsageProfile::Gentle => "gentle",
            UsageProfile::Mixed => "mixed",
            UsageProfile::FastHeavy => "fast-heavy",
        };
        write!(f, "{}", s)
    }
}

/// Session generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionGeneratorConfig {
    /// Number of sessions to generate
    pub session_count: usize,

    /// Driver usage profile
    pub profile: UsageProfile,

    /// Battery capacity the sessions charge into (kWh)
    pub battery_capacity_kwh: f64,

    /// History window ending at the generation instant (days)
    pub history_days: i64,

    /// Mean ambient temperature during charging (Celsius)
    pub mean_temperature_c: f64,

    /// Std dev for ambient temperature (Celsius)
    pub temperature_std_c: f64,

    /// Random seed for reproducibility
    pub random_seed: Option<u64>,
}

impl Default for SessionGeneratorConfig {
    fn default() -> Self {
        Self {
            session_count: 60,          // ~weekly charging over a year
            profile: UsageProfile::Mixed,
            battery_capacity_kwh: 60.0, // Typical mid-size EV
            history_days: 365,
            mean_temperature_c: 15.0,   // Central European average
            temperature_std_c: 8.0,
            random_seed: None,
        }
    }
}

impl SessionGeneratorConfig {
    /// Careful owner, home AC charging only
    pub fn gentle() -> Self {
        Self {
            profile: UsageProfile::Gentle,
            ..Default::default()
        }
    }

    /// Frequent long-distance driver on DC fast chargers
    pub fn fast_heavy() -> Self {
        Self {
            profile: UsageProfile::FastHeavy,
            ..Default::default()
        }
    }

    /// Hot climate, chargers regularly above 30 degrees
    pub fn hot_climate() -> Self {
        Self {
            mean_temperature_c: 32.0,
            temperature_std_c: 4.0,
            ..Default::default()
        }
    }
}

/// Synthetic charging history generator
pub struct SessionGenerator {
    config: SessionGeneratorConfig,
    rng: rand::rngs::StdRng,
}

impl SessionGenerator {
    pub fn new(config: SessionGeneratorConfig) -> Self {
        use rand::SeedableRng;

        let rng = match config.random_seed {
            Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
            None => rand::rngs::StdRng::from_entropy(),
        };

        Self { config, rng }
    }

    /// Generate the configured number of sessions, oldest first, all
    /// strictly before `end_time` and within the history window.
    pub fn generate(&mut self, end_time: DateTime<Utc>) -> Vec<ChargingRecord> {
        let count = self.config.session_count;
        if count == 0 {
            return Vec::new();
        }

        let params = self.config.profile.params();
        // window of at least one day keeps the jitter range non-empty
        let step_hours = self.config.history_days.max(1) as f64 * 24.0 / count as f64;

        let mut records = Vec::with_capacity(count);
        for i in 0..count {
            // evenly stepped slots, jittered inside each slot
            let hours_back =
                step_hours * (count - i) as f64 - self.rng.gen_range(0.0..step_hours);
            let timestamp = end_time - Duration::minutes((hours_back * 60.0) as i64);

            records.push(self.sample_session(timestamp, &params));
        }
        records
    }

    fn sample_session(&mut self, timestamp: DateTime<Utc>, params: &ProfileParams) -> ChargingRecord {
        let is_fast = self.rng.gen_bool(params.fast_probability);
        let charger_power_kw = self.sample_power(is_fast);

        let start_soc = if self.rng.gen_bool(params.deep_discharge_probability) {
            self.rng.gen_range(0.03..0.15)
        } else {
            self.rng.gen_range(0.15..0.5)
        };
        let depth = Normal::new(params.depth_mean, params.depth_std)
            .unwrap()
            .sample(&mut self.rng)
            .clamp(0.1, 0.95);
        let end_soc = (start_soc + depth).min(1.0);

        // 92% charger efficiency; tiny top-ups still draw some energy
        let energy_kwh =
            ((end_soc - start_soc) * self.config.battery_capacity_kwh / 0.92).max(0.5);
        let duration_minutes = energy_kwh / charger_power_kw * 60.0;

        let temperature_c = self
            .rng
            .gen_bool(0.9)
            .then(|| self.sample_temperature());

        ChargingRecord {
            timestamp,
            start_soc,
            end_soc,
            energy_kwh,
            duration_minutes,
            charger_power_kw,
            temperature_c,
            is_fast_charge: is_fast,
        }
    }

    fn sample_power(&mut self, is_fast: bool) -> f64 {
        if is_fast {
            Normal::<f64>::new(120.0, 25.0)
                .unwrap()
                .sample(&mut self.rng)
                .clamp(55.0, 250.0)
        } else {
            Normal::<f64>::new(11.0, 3.0)
                .unwrap()
                .sample(&mut self.rng)
                .clamp(3.7, 22.0)
        }
    }

    fn sample_temperature(&mut self) -> f64 {
        Normal::new(self.config.mean_temperature_c, self.config.temperature_std_c)
            .unwrap()
            .sample(&mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use validator::Validate;

    fn end_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    fn seeded(config: SessionGeneratorConfig, seed: u64) -> SessionGenerator {
        SessionGenerator::new(SessionGeneratorConfig {
            random_seed: Some(seed),
            ..config
        })
    }

    #[test]
    fn test_seeded_generator_is_deterministic() {
        let a = seeded(SessionGeneratorConfig::default(), 42).generate(end_time());
        let b = seeded(SessionGeneratorConfig::default(), 42).generate(end_time());
        assert_eq!(a, b);

        let c = seeded(SessionGeneratorConfig::default(), 43).generate(end_time());
        assert_ne!(a, c);
    }

    #[test]
    fn test_generated_records_pass_validation() {
        let records = seeded(SessionGeneratorConfig::default(), 7).generate(end_time());

        assert_eq!(records.len(), 60);
        for record in &records {
            record.validate().unwrap();
            assert!(record.end_soc > record.start_soc);
            assert!(record.end_soc <= 1.0);
        }
    }

    #[test]
    fn test_timestamps_ordered_within_window() {
        let records = seeded(SessionGeneratorConfig::default(), 7).generate(end_time());

        let window_start = end_time() - Duration::days(365);
        for pair in records.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        for record in &records {
            assert!(record.timestamp < end_time());
            assert!(record.timestamp >= window_start);
        }
    }

    #[test]
    fn test_profiles_shift_fast_charge_share() {
        let fast_share = |config: SessionGeneratorConfig| {
            let config = SessionGeneratorConfig {
                session_count: 400,
                ..config
            };
            let records = seeded(config, 11).generate(end_time());
            let fast = records.iter().filter(|r| r.is_fast()).count();
            fast as f64 / records.len() as f64
        };

        let gentle = fast_share(SessionGeneratorConfig::gentle());
        let mixed = fast_share(SessionGeneratorConfig::default());
        let heavy = fast_share(SessionGeneratorConfig::fast_heavy());

        assert!(gentle < mixed);
        assert!(mixed < heavy);
        assert!(heavy > 0.5);
    }

    #[test]
    fn test_usage_profile_parses_and_displays() {
        assert_eq!("gentle".parse::<UsageProfile>().unwrap(), UsageProfile::Gentle);
        assert_eq!("Fast-Heavy".parse::<UsageProfile>().unwrap(), UsageProfile::FastHeavy);
        assert!("sporty".parse::<UsageProfile>().is_err());
        assert_eq!(UsageProfile::Mixed.to_string(), "mixed");
    }

    #[test]
    fn test_zero_sessions_yield_empty_history() {
        let config = SessionGeneratorConfig {
            session_count: 0,
            ..Default::default()
        };
        let records = seeded(config, 1).generate(end_time());
        assert!(records.is_empty());
    }
}
