//! # Battery Value Passport
//!
//! Shareable certificate summarizing a health report. Sits outside the
//! analysis core: it only reads report fields and stamps them with a
//! short certification digest so a third party (buyer, dealer, insurer)
//! can check the document was not edited after issuance.
//!
//! The digest is an authenticity token, not a credential. Anyone with
//! the passport contents can recompute it; what it proves is that the
//! SoH figure, vehicle id and issue time still match.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::domain::{
    BatteryChemistry, DegradationPrediction, HealthGrade, HealthReport, VehicleProfile,
};

/// Length of the truncated certification digest (hex characters)
pub const CERT_HASH_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum PassportError {
    /// Issuing requires a vehicle id for the certification digest
    #[error("vehicle profile has no vehicle_id; a passport cannot be certified without one")]
    MissingVehicleId,

    /// Recomputed digest does not match the one on the document
    #[error("certification hash mismatch: expected {expected}, found {found}")]
    HashMismatch { expected: String, found: String },

    /// Passport presented after its validity window closed
    #[error("passport expired on {0}")]
    Expired(DateTime<Utc>),
}

/// Battery value passport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passport {
    pub passport_id: Uuid,
    pub vehicle_id: Uuid,
    pub vin: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,

    pub make: Option<String>,
    pub model: Option<String>,
    pub first_registration_year: Option<i32>,
    pub mileage_km: Option<u32>,
    pub battery_chemistry: BatteryChemistry,

    /// State of Health at issuance (percent)
    pub soh_percent: f64,
    pub health_grade: HealthGrade,
    pub health_summary: String,
    /// Usable capacity at issuance (kWh)
    pub estimated_capacity_kwh: f64,

    /// Upper-cased 16-character SHA-256 prefix over id, SoH and issue time
    pub certification_hash: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_soh_1year: Option<f64>,
    /// Years until the 80% warranty threshold, when a forecast was run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_remaining_years: Option<f64>,
}

/// Issues and verifies passports against the injected clock.
pub struct PassportIssuer<C: Clock = SystemClock> {
    clock: C,
}

impl PassportIssuer<SystemClock> {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl Default for PassportIssuer<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> PassportIssuer<C> {
    /// Issuer reading "now" from the given clock
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Issue a passport for the given report. The prediction is
    /// optional; without one the forward-looking fields stay empty.
    pub fn issue(
        &self,
        profile: &VehicleProfile,
        report: &HealthReport,
        prediction: Option<&DegradationPrediction>,
    ) -> Result<Passport, PassportError> {
        let vehicle_id = profile.vehicle_id.ok_or(PassportError::MissingVehicleId)?;

        let issued_at = self.clock.now();
        let certification_hash = certification_hash(vehicle_id, report.soh_percent, issued_at);

        let passport = Passport {
            passport_id: Uuid::new_v4(),
            vehicle_id,
            vin: profile.vin.clone(),
            issued_at,
            valid_until: end_of_next_year(issued_at),
            make: profile.make.clone(),
            model: profile.model.clone(),
            first_registration_year: profile.first_registration_year,
            mileage_km: profile.mileage_km,
            battery_chemistry: profile.battery_chemistry,
            soh_percent: report.soh_percent,
            health_grade: report.health_grade,
            health_summary: report.health_grade.summary(report.soh_percent),
            estimated_capacity_kwh: report.estimated_capacity_kwh,
            certification_hash,
            predicted_soh_1year: prediction.map(|p| p.predicted_soh_1year),
            estimated_remaining_years: prediction.and_then(|p| p.years_to_80_percent),
        };

        info!(
            passport_id = %passport.passport_id,
            vehicle_id = %vehicle_id,
            soh = report.soh_percent,
            "passport issued"
        );
        Ok(passport)
    }

    /// Check a presented passport: the digest must recompute to the
    /// same value, and the validity window must still be open.
    pub fn verify(&self, passport: &Passport) -> Result<(), PassportError> {
        let expected = certification_hash(
            passport.vehicle_id,
            passport.soh_percent,
            passport.issued_at,
        );
        if expected != passport.certification_hash {
            return Err(PassportError::HashMismatch {
                expected,
                found: passport.certification_hash.clone(),
            });
        }
        if self.clock.now() > passport.valid_until {
            return Err(PassportError::Expired(passport.valid_until));
        }
        Ok(())
    }
}

/// SHA-256 over `"{vehicle_id}:{soh:.1}:{issued_at RFC3339}"`, hex,
/// truncated to the first 16 characters and upper-cased. Deterministic
/// given its three inputs.
pub fn certification_hash(vehicle_id: Uuid, soh_percent: f64, issued_at: DateTime<Utc>) -> String {
    let payload = format!(
        "{}:{:.1}:{}",
        vehicle_id,
        soh_percent,
        issued_at.to_rfc3339()
    );
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..CERT_HASH_LEN].to_uppercase()
}

/// Passports stay valid through the end of the year after issuance.
fn end_of_next_year(issued_at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(issued_at.year() + 1, 12, 31, 23, 59, 59)
        .unwrap()
}
