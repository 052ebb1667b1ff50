//! Leaderboard ranking by category and activity period

use crate::clock::Clock;
use carepoints_core::{
    Error, LeaderboardCategory, LeaderboardEntry, LeaderboardPeriod, Result,
};
use carepoints_persistence::cache::{LeaderboardCache, LeaderboardKey};
use carepoints_persistence::sqlite::fetch_leaderboard;
use carepoints_persistence::Database;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 100;

fn category_key(entry: &LeaderboardEntry, category: LeaderboardCategory) -> i64 {
    match category {
        LeaderboardCategory::Overall => entry.care_points,
        LeaderboardCategory::Streak => entry.current_streak,
        LeaderboardCategory::Checkins => entry.total_checkins,
        LeaderboardCategory::MoodStreak => entry.mood_streak,
        LeaderboardCategory::JournalStreak => entry.journal_streak,
    }
}

fn assign_ranks(entries: &mut [LeaderboardEntry]) {
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index as u32 + 1;
    }
}

/// Sort by the category key with `care_points` as tie-breaker, then drop
/// users inactive in the period. Ranks are 1-based and reassigned after
/// each pass.
pub fn rank(
    mut entries: Vec<LeaderboardEntry>,
    category: LeaderboardCategory,
    period: LeaderboardPeriod,
    today: NaiveDate,
) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| {
        category_key(b, category)
            .cmp(&category_key(a, category))
            .then(b.care_points.cmp(&a.care_points))
    });
    assign_ranks(&mut entries);

    if let Some(cutoff) = period.cutoff(today) {
        entries.retain(|e| e.last_activity.is_some_and(|d| d >= cutoff));
        assign_ranks(&mut entries);
    }

    entries
}

/// Ranked views over the top balances, cached briefly
#[derive(Clone)]
pub struct LeaderboardService {
    db: Database,
    clock: Arc<dyn Clock>,
    cache: Arc<LeaderboardCache>,
}

impl LeaderboardService {
    pub fn new(db: Database, clock: Arc<dyn Clock>, cache: Arc<LeaderboardCache>) -> Self {
        Self { db, clock, cache }
    }

    pub async fn top(
        &self,
        category: LeaderboardCategory,
        period: LeaderboardPeriod,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>> {
        if limit == 0 || limit > MAX_LIMIT {
            return Err(Error::ValidationError(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }

        let key = LeaderboardKey {
            category,
            period,
            limit,
        };
        if let Some(board) = self.cache.get(&key) {
            debug!("Leaderboard cache hit for {:?}", key);
            return Ok(board);
        }

        let today = self.clock.today();
        let entries = fetch_leaderboard(self.db.pool(), limit, today).await?;
        let board = rank(entries, category, period, today);
        self.cache.insert(key, board.clone());
        Ok(board)
    }

    /// Drop cached views so the next read sees fresh balances
    pub fn invalidate(&self) {
        self.cache.clear();
    }
}
