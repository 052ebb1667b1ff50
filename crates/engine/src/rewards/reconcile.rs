use crate::config::RewardsConfig;
use crate::rewards::engine::RewardsEngine;
use crate::streak::projected_streak;
use carepoints_core::{ActivityRecord, ActivityType, Error, Result, UserStats};
use carepoints_persistence::sqlite::{all_activity_records, commit, require_user, save_stats};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;
use tracing::info;

/// Recompute the stats aggregate from the activity log.
///
/// Streak counters describe the run ending at the latest matching day,
/// the same value the last award stored.
pub fn rebuild_stats(
    user_id: &str,
    records: &[ActivityRecord],
    config: &RewardsConfig,
) -> Result<UserStats> {
    let mut stats = UserStats::new(user_id);
    let lookback = config.streak_lookback_days;

    let points = records
        .iter()
        .try_fold(0i64, |sum, r| sum.checked_add(r.points_earned))
        .ok_or_else(|| Error::InvalidData(format!("point total for {} overflows", user_id)))?;
    stats.add_points(points, config.points_per_level)?;

    let qualifying = config.qualifying_types();
    let days = distinct_days(records, &qualifying);
    stats.total_checkins = days.len() as i64;
    stats.last_checkin = days.first().copied();
    stats.current_streak = days
        .first()
        .map(|last| projected_streak(&days, *last, lookback))
        .unwrap_or(0);
    stats.longest_streak = longest_run(&days).max(stats.current_streak);

    stats.mood_streak = run_at_latest(&distinct_days(records, &[ActivityType::Mood]), lookback);
    stats.journal_streak = run_at_latest(&distinct_days(records, &[ActivityType::Journal]), lookback);

    Ok(stats)
}

/// Distinct days with a record of the given types, newest first
fn distinct_days(records: &[ActivityRecord], types: &[ActivityType]) -> Vec<NaiveDate> {
    let set: BTreeSet<NaiveDate> = records
        .iter()
        .filter(|r| types.contains(&r.activity_type))
        .map(|r| r.activity_date)
        .collect();
    set.into_iter().rev().collect()
}

fn run_at_latest(days: &[NaiveDate], lookback: u32) -> i64 {
    days.first()
        .map(|last| projected_streak(days, *last, lookback))
        .unwrap_or(0)
}

fn longest_run(days: &[NaiveDate]) -> i64 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    // Newest first, so consecutive days differ by -1
    for day in days {
        run = match previous {
            Some(p) if p - Duration::days(1) == *day => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }

    longest
}

impl RewardsEngine {
    /// Rebuild a user's stats from their activity records and store them.
    /// The spendable balance is left alone since transfers also move it.
    pub async fn reconcile_stats(&self, user_id: &str) -> Result<UserStats> {
        let _guard = self.locks().lock(user_id).await;
        let mut tx = self.database().begin().await?;

        require_user(&mut *tx, user_id).await?;
        let records = all_activity_records(&mut *tx, user_id).await?;
        let stats = rebuild_stats(user_id, &records, self.config())?;
        save_stats(&mut *tx, &stats).await?;
        commit(tx).await?;

        info!(
            "Reconciled stats for {} from {} records: {} points, streak {}",
            user_id,
            records.len(),
            stats.total_points,
            stats.current_streak
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::locks::UserLocks;
    use carepoints_persistence::sqlite::{get_or_create_user_by_wallet, get_stats};
    use carepoints_persistence::Database;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    #[test]
    fn test_longest_run() {
        let d = |n: u32| NaiveDate::from_ymd_opt(2024, 5, n).unwrap();
        assert_eq!(longest_run(&[]), 0);
        assert_eq!(longest_run(&[d(9), d(8), d(4), d(3), d(2), d(1)]), 4);
        assert_eq!(longest_run(&[d(9)]), 1);
    }

    #[tokio::test]
    async fn test_reconcile_repairs_drifted_stats() {
        let db = Database::connect_in_memory().await.unwrap();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let engine = RewardsEngine::new(
            db.clone(),
            RewardsConfig::default(),
            clock.clone(),
            Arc::new(UserLocks::new()),
        );
        let mut conn = db.pool().acquire().await.unwrap();
        let user = get_or_create_user_by_wallet(&mut conn, "0xdrift", None)
            .await
            .unwrap();
        drop(conn);

        for day in 0..5 {
            engine.award(&user.id, ActivityType::Checkin, 0).await.unwrap();
            if day % 2 == 0 {
                engine.award(&user.id, ActivityType::Mood, 0).await.unwrap();
            }
            engine.award(&user.id, ActivityType::Community, 0).await.unwrap();
            clock.advance_days(1);
        }
        clock.advance_days(2);
        engine.award(&user.id, ActivityType::Journal, 0).await.unwrap();

        let before = get_stats(db.pool(), &user.id).await.unwrap().unwrap();

        save_stats(db.pool(), &UserStats::new(user.id.as_str())).await.unwrap();

        let rebuilt = engine.reconcile_stats(&user.id).await.unwrap();
        assert_eq!(
            rebuilt,
            UserStats {
                updated_at: None,
                ..before
            }
        );
        assert_eq!(rebuilt.current_streak, 1);
        assert_eq!(rebuilt.longest_streak, 5);
        assert_eq!(rebuilt.total_checkins, 6);
        assert_eq!(rebuilt.mood_streak, 1);
    }
}
