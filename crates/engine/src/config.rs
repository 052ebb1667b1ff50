//! Reward rules per activity type, persisted in the settings table

use carepoints_core::{ActivityType, Error, Result};
use carepoints_persistence::sqlite::{load_setting, save_setting};
use carepoints_persistence::Database;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings key for the persisted config
pub const REWARDS_CONFIG_KEY: &str = "rewards_config";

/// Points and daily cap for one activity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRule {
    pub base_points: i64,
    pub max_daily: u32,
    /// Counts toward (and extends) the daily streak
    pub streak_qualifying: bool,
}

impl ActivityRule {
    const fn new(base_points: i64, max_daily: u32, streak_qualifying: bool) -> Self {
        Self {
            base_points,
            max_daily,
            streak_qualifying,
        }
    }
}

/// Tunable reward rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardsConfig {
    pub mood: ActivityRule,
    pub journal: ActivityRule,
    pub checkin: ActivityRule,
    pub community: ActivityRule,
    /// Maximum number of past days the streak walk inspects
    pub streak_lookback_days: u32,
    pub points_per_level: i64,
    /// CARE credited for writing a comment
    pub comment_reward: i64,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            mood: ActivityRule::new(10, 1, true),
            journal: ActivityRule::new(15, 1, true),
            checkin: ActivityRule::new(10, 1, true),
            community: ActivityRule::new(5, 3, false),
            streak_lookback_days: 365,
            points_per_level: 100,
            comment_reward: 10,
        }
    }
}

impl RewardsConfig {
    pub fn rule(&self, activity: ActivityType) -> &ActivityRule {
        match activity {
            ActivityType::Mood => &self.mood,
            ActivityType::Journal => &self.journal,
            ActivityType::Checkin => &self.checkin,
            ActivityType::Community => &self.community,
        }
    }

    /// Activity types whose records count as streak days
    pub fn qualifying_types(&self) -> Vec<ActivityType> {
        ActivityType::ALL
            .into_iter()
            .filter(|a| self.rule(*a).streak_qualifying)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        for activity in ActivityType::ALL {
            let rule = self.rule(activity);
            if rule.base_points < 0 {
                return Err(Error::ValidationError(format!(
                    "{} base_points must be >= 0",
                    activity
                )));
            }
            if rule.max_daily == 0 {
                return Err(Error::ValidationError(format!(
                    "{} max_daily must be >= 1",
                    activity
                )));
            }
        }
        if self.streak_lookback_days == 0 {
            return Err(Error::ValidationError(
                "streak_lookback_days must be >= 1".to_string(),
            ));
        }
        if self.points_per_level <= 0 {
            return Err(Error::ValidationError(
                "points_per_level must be > 0".to_string(),
            ));
        }
        if self.comment_reward < 0 {
            return Err(Error::ValidationError(
                "comment_reward must be >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load the persisted config, falling back to defaults
pub async fn load_rewards_config(db: &Database) -> Result<RewardsConfig> {
    let config = match load_setting::<_, RewardsConfig>(db.pool(), REWARDS_CONFIG_KEY).await? {
        Some(config) => config,
        None => {
            debug!("No persisted rewards config, using defaults");
            RewardsConfig::default()
        }
    };
    config.validate()?;
    Ok(config)
}

/// Validate and persist the config
pub async fn save_rewards_config(db: &Database, config: &RewardsConfig) -> Result<()> {
    config.validate()?;
    save_setting(db.pool(), REWARDS_CONFIG_KEY, config).await
}
