//! Point policies: streak multiplier and activity bonuses

mod bonus;
mod multiplier;

pub use bonus::*;
pub use multiplier::*;
