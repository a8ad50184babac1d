pub mod charging;
pub mod prediction;
pub mod report;
pub mod vehicle;

pub use charging::*;
pub use prediction::*;
pub use report::*;
pub use vehicle::*;
