//! Activity audit records and award results

use crate::ActivityType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Append-only audit row, one per successful award
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: i64,
    pub user_id: String,
    pub activity_type: ActivityType,
    /// UTC calendar day of `created_at`
    pub activity_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub points_earned: i64,
    /// Streak value at time of award
    pub streak_days: i64,
}

/// Outcome of a successful award
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardResult {
    pub activity_type: ActivityType,
    pub base_points: i64,
    pub bonus_points: i64,
    pub multiplier: f64,
    pub final_points: i64,
    pub new_streak: i64,
    pub longest_streak: i64,
    pub new_level: i64,
    pub new_total: i64,
    pub total_checkins: i64,
    /// Spendable balance after the award
    pub care_points: i64,
    /// First qualifying activity of a new day
    pub day_advanced: bool,
}

/// Points outcome attached to an otherwise-successful primary action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PointsOutcome {
    Awarded(AwardResult),
    /// Daily cap or another business rule; informational
    Skipped { reason: String },
    /// The rewards engine failed; the primary action still stands
    Degraded { reason: String },
}

impl PointsOutcome {
    pub fn points(&self) -> i64 {
        match self {
            PointsOutcome::Awarded(result) => result.final_points,
            _ => 0,
        }
    }

    pub fn award(&self) -> Option<&AwardResult> {
        match self {
            PointsOutcome::Awarded(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, PointsOutcome::Degraded { .. })
    }
}
