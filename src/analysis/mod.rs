pub mod analyzer;
pub mod model;

pub use analyzer::*;
pub use model::*;
