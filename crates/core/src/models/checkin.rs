//! Daily mood-score check-in models

use crate::PointsOutcome;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const MOOD_LABELS: [&str; 10] = [
    "Terrible",
    "Very Bad",
    "Bad",
    "Poor",
    "Okay",
    "Good",
    "Very Good",
    "Great",
    "Excellent",
    "Amazing",
];

/// Label for a 1-10 mood score
pub fn mood_label(score: u8) -> Option<&'static str> {
    match score {
        1..=10 => Some(MOOD_LABELS[(score - 1) as usize]),
        _ => None,
    }
}

/// Inbound check-in payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckinRequest {
    pub mood_score: u8,
    #[serde(default)]
    pub emotions: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub gratitude: String,
    #[serde(default)]
    pub public_gratitude: bool,
}

/// Stored check-in, one per user per UTC day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCheckin {
    pub user_id: String,
    pub date: NaiveDate,
    pub mood: u8,
    pub mood_label: String,
    pub notes: String,
    pub gratitude_note: String,
    pub emotions: Vec<String>,
    pub points: i64,
    pub streak: i64,
}

/// Streak milestone badge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub badge_type: String,
    pub title: String,
    pub description: String,
}

impl Badge {
    pub fn streak_milestone(days: i64) -> Self {
        Self {
            badge_type: format!("streak_{}", days),
            title: format!("{} Day Streak", days),
            description: format!("Completed {} consecutive days of check-ins", days),
        }
    }
}

/// Everything a check-in produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinOutcome {
    pub checkin: DailyCheckin,
    pub points: PointsOutcome,
    pub new_badges: Vec<Badge>,
}
