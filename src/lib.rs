//! Battery Passport
//!
//! Battery health analysis for electric vehicles:
//! - State of Health estimation from charging telemetry
//! - Degradation forecasting (trend fit or empirical chemistry model)
//! - Shareable, hash-certified battery value passports
//! - Synthetic fleet histories for demos and tests

pub mod analysis;
pub mod clock;
pub mod config;
pub mod domain;
pub mod forecast;
pub mod passport;
pub mod simulation;
pub mod telemetry;

mod util;

// Re-exports for convenience
pub use analysis::SohAnalyzer;
pub use config::Config;
pub use forecast::DegradationForecaster;
pub use passport::PassportIssuer;
