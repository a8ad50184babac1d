//! # Fleet Simulation Module
//!
//! Synthetic charging histories for demos, benchmarks and tests.
//! The generator produces records that pass boundary validation and,
//! when seeded, reproduce bit-for-bit.

pub mod sessions;

pub use sessions::{SessionGenerator, SessionGeneratorConfig, UsageProfile};
