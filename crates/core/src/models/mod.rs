//! Data models for ledger entities

mod activity;
mod checkin;
mod leaderboard;
mod stats;
mod transaction;
mod user;

pub use activity::*;
pub use checkin::*;
pub use leaderboard::*;
pub use stats::*;
pub use transaction::*;
pub use user::*;
