//! Leaderboard-related models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One ranked row; `rank` is 1-based
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    pub name: String,
    pub wallet_address: String,
    pub care_points: i64,
    pub level: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub total_checkins: i64,
    pub mood_streak: i64,
    pub journal_streak: i64,
    pub last_activity: Option<NaiveDate>,
}
