//! SQLite database management

mod activities;
mod badges;
mod checkins;
mod connection;
mod leaderboard;
mod settings;
mod stats;
mod transactions;
mod users;

pub use activities::*;
pub use badges::*;
pub use checkins::*;
pub use connection::{commit, Database};
pub use leaderboard::*;
pub use settings::*;
pub use stats::*;
pub use transactions::*;
pub use users::*;
