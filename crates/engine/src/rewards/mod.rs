//! Rewards engine: awards, daily check-ins, post-award events and repair

mod checkin;
mod engine;
mod hooks;
mod reconcile;

pub use checkin::CheckinService;
pub use engine::RewardsEngine;
pub use hooks::{spawn_hook, RewardEvent, RewardHook};
pub use reconcile::rebuild_stats;
