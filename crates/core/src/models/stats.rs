//! Durable per-user counters maintained by the rewards engine

use crate::{level_for_points, Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One-to-one with `User`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: String,
    /// Lifetime points awarded by the rewards engine (never spent)
    pub total_points: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub mood_streak: i64,
    pub journal_streak: i64,
    pub total_checkins: i64,
    pub level: i64,
    /// Date of the last streak-qualifying activity
    pub last_checkin: Option<NaiveDate>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserStats {
    /// Zeroed defaults for a user's first activity
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            total_points: 0,
            current_streak: 0,
            longest_streak: 0,
            mood_streak: 0,
            journal_streak: 0,
            total_checkins: 0,
            level: 1,
            last_checkin: None,
            updated_at: None,
        }
    }

    /// Add lifetime points and re-derive the level.
    /// Fails without touching the stats if the total would overflow.
    pub fn add_points(&mut self, points: i64, points_per_level: i64) -> Result<()> {
        self.total_points = self
            .total_points
            .checked_add(points)
            .ok_or_else(|| Error::ValidationError("lifetime point total overflows".to_string()))?;
        self.level = level_for_points(self.total_points, points_per_level);
        Ok(())
    }

    /// Set the current streak, keeping `longest_streak >= current_streak`
    pub fn set_streak(&mut self, streak: i64) {
        self.current_streak = streak;
        self.longest_streak = self.longest_streak.max(streak);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_streak_never_decreases() {
        let mut stats = UserStats::new("u1");
        stats.set_streak(5);
        stats.set_streak(1);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 5);
    }

    #[test]
    fn test_level_follows_points() {
        let mut stats = UserStats::new("u1");
        stats.add_points(95, 100).unwrap();
        assert_eq!(stats.level, 1);
        stats.add_points(10, 100).unwrap();
        assert_eq!(stats.total_points, 105);
        assert_eq!(stats.level, 2);
    }

    #[test]
    fn test_add_points_rejects_overflow() {
        let mut stats = UserStats::new("u1");
        stats.add_points(i64::MAX - 5, 100).unwrap();
        let before = stats.clone();

        assert!(matches!(
            stats.add_points(6, 100),
            Err(Error::ValidationError(_))
        ));
        assert_eq!(stats, before);
    }
}
