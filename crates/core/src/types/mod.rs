//! Shared type definitions and enums

use crate::Error;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of reward-earning action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Mood,
    Journal,
    Checkin,
    Community,
}

impl ActivityType {
    pub const ALL: [ActivityType; 4] = [
        ActivityType::Mood,
        ActivityType::Journal,
        ActivityType::Checkin,
        ActivityType::Community,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Mood => "mood",
            ActivityType::Journal => "journal",
            ActivityType::Checkin => "checkin",
            ActivityType::Community => "community",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mood" => Ok(ActivityType::Mood),
            "journal" => Ok(ActivityType::Journal),
            "checkin" => Ok(ActivityType::Checkin),
            "community" => Ok(ActivityType::Community),
            other => Err(Error::InvalidData(format!("unknown activity type: {}", other))),
        }
    }
}

/// Why CARE points moved between balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Tip on a community post
    Tip,
    /// "Send CARE" interaction on a post
    SendCare,
    /// System credit for writing a comment (no sender)
    CommentReward,
}

impl TransferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Tip => "tip",
            TransferKind::SendCare => "send_care",
            TransferKind::CommentReward => "comment_reward",
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tip" => Ok(TransferKind::Tip),
            "send_care" => Ok(TransferKind::SendCare),
            "comment_reward" => Ok(TransferKind::CommentReward),
            other => Err(Error::InvalidData(format!("unknown transfer kind: {}", other))),
        }
    }
}

/// Secondary sort key for the leaderboard (primary tie-breaker is always `care_points`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardCategory {
    #[default]
    Overall,
    Streak,
    Checkins,
    MoodStreak,
    JournalStreak,
}

impl FromStr for LeaderboardCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overall" => Ok(LeaderboardCategory::Overall),
            "streak" => Ok(LeaderboardCategory::Streak),
            "checkins" => Ok(LeaderboardCategory::Checkins),
            "mood_streak" => Ok(LeaderboardCategory::MoodStreak),
            "journal_streak" => Ok(LeaderboardCategory::JournalStreak),
            other => Err(Error::ValidationError(format!(
                "unknown leaderboard category: {}",
                other
            ))),
        }
    }
}

/// Activity window for leaderboard filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeaderboardPeriod {
    Today,
    Week,
    Month,
    #[default]
    AllTime,
}

impl LeaderboardPeriod {
    /// Earliest last-activity date still inside the window, `None` for all-time
    pub fn cutoff(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            LeaderboardPeriod::Today => Some(today),
            LeaderboardPeriod::Week => Some(today - Duration::days(7)),
            LeaderboardPeriod::Month => today.checked_sub_months(chrono::Months::new(1)),
            LeaderboardPeriod::AllTime => None,
        }
    }
}

impl FromStr for LeaderboardPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(LeaderboardPeriod::Today),
            "week" => Ok(LeaderboardPeriod::Week),
            "month" => Ok(LeaderboardPeriod::Month),
            "all-time" => Ok(LeaderboardPeriod::AllTime),
            other => Err(Error::ValidationError(format!(
                "unknown leaderboard period: {}",
                other
            ))),
        }
    }
}

/// Level derived from lifetime points: `floor(total / per_level) + 1`
pub fn level_for_points(total_points: i64, points_per_level: i64) -> i64 {
    total_points.max(0) / points_per_level.max(1) + 1
}
