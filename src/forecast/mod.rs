pub mod degradation;

pub use degradation::*;
