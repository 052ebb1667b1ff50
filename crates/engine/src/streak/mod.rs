//! Streak derivation from activity history

mod calculator;

pub use calculator::*;
