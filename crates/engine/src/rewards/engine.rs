use crate::clock::Clock;
use crate::config::RewardsConfig;
use crate::locks::UserLocks;
use crate::policy::{apply_multiplier, journal_bonus, multiplier};
use crate::rewards::hooks::RewardEvent;
use crate::streak::{current_streak, live_streak, projected_streak, recent_days};
use carepoints_core::{ActivityType, AwardResult, Error, PointsOutcome, Result, UserStats};
use carepoints_persistence::sqlite::{
    commit, count_activities_on, credit_care_points, ensure_stats, get_stats as stored_stats,
    insert_activity_record, require_user, save_stats,
};
use carepoints_persistence::Database;
use chrono::NaiveDate;
use sqlx::SqliteConnection;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, instrument, warn};

const EVENT_CAPACITY: usize = 256;

/// Awards points for activities and maintains streaks, levels and balances
#[derive(Clone)]
pub struct RewardsEngine {
    db: Database,
    config: Arc<RewardsConfig>,
    clock: Arc<dyn Clock>,
    locks: Arc<UserLocks>,
    events: broadcast::Sender<RewardEvent>,
}

impl RewardsEngine {
    pub fn new(
        db: Database,
        config: RewardsConfig,
        clock: Arc<dyn Clock>,
        locks: Arc<UserLocks>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            db,
            config: Arc::new(config),
            clock,
            locks,
            events,
        }
    }

    pub fn config(&self) -> &RewardsConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn locks(&self) -> &Arc<UserLocks> {
        &self.locks
    }

    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<RewardEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&self, event: RewardEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Award points for one activity.
    ///
    /// Runs under the user's lock in a single transaction: daily cap check,
    /// streak and multiplier, audit record, stats and balance all commit
    /// together or not at all.
    #[instrument(skip(self))]
    pub async fn award(
        &self,
        user_id: &str,
        activity: ActivityType,
        bonus_points: i64,
    ) -> Result<AwardResult> {
        if bonus_points < 0 {
            return Err(Error::ValidationError(
                "bonus points must be >= 0".to_string(),
            ));
        }

        let rule = *self.config.rule(activity);
        let lookback = self.config.streak_lookback_days;
        let _guard = self.locks.lock(user_id).await;

        let now = self.clock.now();
        let today = now.date_naive();
        let mut tx = self.db.begin().await?;

        require_user(&mut *tx, user_id).await?;

        let done_today = count_activities_on(&mut *tx, user_id, activity, today).await?;
        if done_today >= rule.max_daily {
            return Err(Error::AlreadyCompletedToday {
                activity,
                max_daily: rule.max_daily,
            });
        }

        let qualifying = self.config.qualifying_types();
        let days = recent_days(&mut tx, user_id, &qualifying, today, lookback).await?;
        let day_advanced = rule.streak_qualifying && days.first() != Some(&today);
        let streak = if rule.streak_qualifying {
            projected_streak(&days, today, lookback)
        } else {
            live_streak(&days, today, lookback)
        };

        let base_points = rule.base_points;
        let final_points = base_points
            .checked_add(bonus_points)
            .and_then(|points| apply_multiplier(points, streak))
            .ok_or_else(|| {
                Error::ValidationError(format!("bonus of {} points is too large", bonus_points))
            })?;

        let mut stats = ensure_stats(&mut tx, user_id).await?;
        stats.add_points(final_points, self.config.points_per_level)?;
        if rule.streak_qualifying {
            stats.set_streak(streak);
        }
        if day_advanced {
            stats.total_checkins += 1;
            stats.last_checkin = Some(today);
        }
        match activity {
            ActivityType::Mood => {
                stats.mood_streak = self.activity_streak(&mut tx, user_id, activity, today).await?;
            }
            ActivityType::Journal => {
                stats.journal_streak =
                    self.activity_streak(&mut tx, user_id, activity, today).await?;
            }
            _ => {}
        }

        insert_activity_record(&mut *tx, user_id, activity, now, final_points, streak).await?;
        save_stats(&mut *tx, &stats).await?;
        let care_points = credit_care_points(&mut *tx, user_id, final_points).await?;
        commit(tx).await?;

        let result = AwardResult {
            activity_type: activity,
            base_points,
            bonus_points,
            multiplier: multiplier(streak),
            final_points,
            new_streak: streak,
            longest_streak: stats.longest_streak,
            new_level: stats.level,
            new_total: stats.total_points,
            total_checkins: stats.total_checkins,
            care_points,
            day_advanced,
        };

        info!(
            "Awarded {} points for {} (streak {}, x{}), total {}",
            final_points, activity, streak, result.multiplier, stats.total_points
        );

        self.publish(RewardEvent::PointsAwarded {
            user_id: user_id.to_string(),
            result: result.clone(),
        });

        Ok(result)
    }

    /// Award attached to a primary action that has already been saved.
    /// Never fails: business rules become `Skipped`, faults become `Degraded`.
    pub async fn award_best_effort(
        &self,
        user_id: &str,
        activity: ActivityType,
        bonus_points: i64,
    ) -> PointsOutcome {
        match self.award(user_id, activity, bonus_points).await {
            Ok(result) => PointsOutcome::Awarded(result),
            Err(e) if e.is_business_rule() => {
                info!("No {} points for {}: {}", activity, user_id, e);
                PointsOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                error!("Points award failed for {} ({}): {}", user_id, activity, e);
                PointsOutcome::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Journal save with its word-count bonus
    pub async fn award_journal_entry(&self, user_id: &str, content: &str) -> PointsOutcome {
        let bonus = journal_bonus(content);
        self.award_best_effort(user_id, ActivityType::Journal, bonus)
            .await
    }

    /// Stats with streaks as of today; zeroed defaults before any activity
    pub async fn get_stats(&self, user_id: &str) -> Result<UserStats> {
        let mut conn = self.acquire().await?;
        require_user(&mut *conn, user_id).await?;

        let mut stats = stored_stats(&mut *conn, user_id)
            .await?
            .unwrap_or_else(|| UserStats::new(user_id));

        let today = self.clock.today();
        let lookback = self.config.streak_lookback_days;
        let qualifying = self.config.qualifying_types();

        let days = recent_days(&mut conn, user_id, &qualifying, today, lookback).await?;
        stats.current_streak = live_streak(&days, today, lookback);

        let mood_days = recent_days(&mut conn, user_id, &[ActivityType::Mood], today, lookback).await?;
        stats.mood_streak = live_streak(&mood_days, today, lookback);

        let journal_days =
            recent_days(&mut conn, user_id, &[ActivityType::Journal], today, lookback).await?;
        stats.journal_streak = live_streak(&journal_days, today, lookback);

        if stats.longest_streak < stats.current_streak {
            warn!("Stored longest streak behind live streak for {}", user_id);
            stats.longest_streak = stats.current_streak;
        }

        Ok(stats)
    }

    /// Streak the next qualifying award today would produce
    pub async fn preview_streak(&self, user_id: &str) -> Result<i64> {
        let mut conn = self.acquire().await?;
        require_user(&mut *conn, user_id).await?;

        current_streak(
            &mut conn,
            user_id,
            &self.config.qualifying_types(),
            self.clock.today(),
            self.config.streak_lookback_days,
        )
        .await
    }

    async fn activity_streak(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        activity: ActivityType,
        today: NaiveDate,
    ) -> Result<i64> {
        let lookback = self.config.streak_lookback_days;
        let days = recent_days(conn, user_id, &[activity], today, lookback).await?;
        Ok(projected_streak(&days, today, lookback))
    }

    async fn acquire(&self) -> Result<sqlx::pool::PoolConnection<sqlx::Sqlite>> {
        self.db
            .pool()
            .acquire()
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use carepoints_core::User;
    use carepoints_persistence::sqlite::{get_or_create_user_by_wallet, list_activity_records};
    use chrono::{TimeZone, Utc};

    async fn setup() -> (RewardsEngine, Arc<FixedClock>, Database) {
        let db = Database::connect_in_memory().await.unwrap();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        ));
        let engine = RewardsEngine::new(
            db.clone(),
            RewardsConfig::default(),
            clock.clone(),
            Arc::new(UserLocks::new()),
        );
        (engine, clock, db)
    }

    async fn new_user(db: &Database, wallet: &str) -> User {
        let mut conn = db.pool().acquire().await.unwrap();
        get_or_create_user_by_wallet(&mut conn, wallet, None).await.unwrap()
    }

    async fn balance(db: &Database, user_id: &str) -> i64 {
        require_user(db.pool(), user_id).await.unwrap().care_points
    }

    #[tokio::test]
    async fn test_three_day_checkin_scenario() {
        let (engine, clock, db) = setup().await;
        let user = new_user(&db, "0xnew").await;

        let day1 = engine.award(&user.id, ActivityType::Checkin, 0).await.unwrap();
        assert_eq!(day1.new_streak, 1);
        assert_eq!(day1.multiplier, 1.0);
        assert_eq!(day1.final_points, 10);
        assert_eq!(day1.new_total, 10);
        assert_eq!(day1.new_level, 1);

        clock.advance_days(1);
        let day2 = engine.award(&user.id, ActivityType::Checkin, 0).await.unwrap();
        assert_eq!(day2.new_streak, 2);
        assert_eq!(day2.final_points, 10);
        assert_eq!(day2.new_total, 20);

        clock.advance_days(1);
        let day3 = engine.award(&user.id, ActivityType::Checkin, 0).await.unwrap();
        assert_eq!(day3.new_streak, 3);
        assert_eq!(day3.multiplier, 1.25);
        assert_eq!(day3.final_points, 12);
        assert_eq!(day3.new_total, 32);
        assert_eq!(day3.total_checkins, 3);

        assert_eq!(balance(&db, &user.id).await, 32);
    }

    #[tokio::test]
    async fn test_second_award_same_day_is_rejected() {
        let (engine, _clock, db) = setup().await;
        let user = new_user(&db, "0xtwice").await;

        engine.award(&user.id, ActivityType::Mood, 0).await.unwrap();
        let err = engine.award(&user.id, ActivityType::Mood, 0).await.unwrap_err();
        assert!(matches!(
            err,
            Error::AlreadyCompletedToday { activity: ActivityType::Mood, max_daily: 1 }
        ));

        let stats = engine.get_stats(&user.id).await.unwrap();
        assert_eq!(stats.total_points, 10);
        assert_eq!(balance(&db, &user.id).await, 10);
        assert_eq!(list_activity_records(db.pool(), &user.id, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_other_activity_same_day_holds_streak() {
        let (engine, clock, db) = setup().await;
        let user = new_user(&db, "0xhold").await;

        engine.award(&user.id, ActivityType::Checkin, 0).await.unwrap();
        clock.advance_days(1);
        let mood = engine.award(&user.id, ActivityType::Mood, 0).await.unwrap();
        assert_eq!(mood.new_streak, 2);
        assert!(mood.day_advanced);

        let journal = engine.award(&user.id, ActivityType::Journal, 0).await.unwrap();
        assert_eq!(journal.new_streak, 2);
        assert!(!journal.day_advanced);
        assert_eq!(journal.total_checkins, 2);
    }

    #[tokio::test]
    async fn test_gap_resets_streak() {
        let (engine, clock, db) = setup().await;
        let user = new_user(&db, "0xgap").await;

        for _ in 0..3 {
            engine.award(&user.id, ActivityType::Checkin, 0).await.unwrap();
            clock.advance_days(1);
        }
        clock.advance_days(1);

        let result = engine.award(&user.id, ActivityType::Checkin, 0).await.unwrap();
        assert_eq!(result.new_streak, 1);
        assert_eq!(result.longest_streak, 3);
        assert_eq!(result.final_points, 10);
    }

    #[tokio::test]
    async fn test_community_cap_and_streak() {
        let (engine, clock, db) = setup().await;
        let user = new_user(&db, "0xcommunity").await;

        for _ in 0..3 {
            engine.award(&user.id, ActivityType::Checkin, 0).await.unwrap();
            clock.advance_days(1);
        }
        clock.set(Utc.with_ymd_and_hms(2024, 6, 3, 18, 0, 0).unwrap());

        // Live streak of 3 gives x1.25 without extending the streak
        for _ in 0..3 {
            let result = engine.award(&user.id, ActivityType::Community, 0).await.unwrap();
            assert_eq!(result.final_points, 6);
            assert_eq!(result.new_streak, 3);
            assert!(!result.day_advanced);
        }
        let err = engine.award(&user.id, ActivityType::Community, 0).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyCompletedToday { max_daily: 3, .. }));

        let stats = engine.get_stats(&user.id).await.unwrap();
        assert_eq!(stats.total_checkins, 3);
        assert_eq!(stats.current_streak, 3);
    }

    #[tokio::test]
    async fn test_community_alone_never_starts_streak() {
        let (engine, _clock, db) = setup().await;
        let user = new_user(&db, "0xlurker").await;

        let result = engine.award(&user.id, ActivityType::Community, 0).await.unwrap();
        assert_eq!(result.final_points, 5);
        assert_eq!(result.new_streak, 0);

        let stats = engine.get_stats(&user.id).await.unwrap();
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.total_points, 5);
        assert_eq!(stats.last_checkin, None);
    }

    #[tokio::test]
    async fn test_level_tracks_total_points() {
        let (engine, clock, db) = setup().await;
        let user = new_user(&db, "0xlevel").await;

        for _ in 0..20 {
            for activity in [ActivityType::Mood, ActivityType::Journal, ActivityType::Checkin] {
                let result = engine.award(&user.id, activity, 5).await.unwrap();
                assert_eq!(result.new_level, result.new_total / 100 + 1);
                assert!(result.longest_streak >= result.new_streak);
            }
            clock.advance_days(1);
        }

        let stats = engine.get_stats(&user.id).await.unwrap();
        assert_eq!(stats.level, stats.total_points / 100 + 1);
        assert_eq!(stats.longest_streak, 20);
        assert_eq!(balance(&db, &user.id).await, stats.total_points);
    }

    #[tokio::test]
    async fn test_concurrent_awards_same_day() {
        let (engine, _clock, db) = setup().await;
        let user = new_user(&db, "0xrace").await;

        let (a, b) = tokio::join!(
            engine.award(&user.id, ActivityType::Checkin, 0),
            engine.award(&user.id, ActivityType::Checkin, 0),
        );

        let outcomes = [a, b];
        let successes = outcomes.iter().filter(|r| r.is_ok()).count();
        let rejected = outcomes
            .iter()
            .filter(|r| matches!(r, Err(Error::AlreadyCompletedToday { .. })))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(rejected, 1);
        assert_eq!(balance(&db, &user.id).await, 10);
    }

    #[tokio::test]
    async fn test_activity_streaks_tracked_separately() {
        let (engine, clock, db) = setup().await;
        let user = new_user(&db, "0xmood").await;

        engine.award(&user.id, ActivityType::Mood, 0).await.unwrap();
        clock.advance_days(1);
        engine.award(&user.id, ActivityType::Mood, 0).await.unwrap();
        engine.award(&user.id, ActivityType::Journal, 0).await.unwrap();

        let stats = engine.get_stats(&user.id).await.unwrap();
        assert_eq!(stats.mood_streak, 2);
        assert_eq!(stats.journal_streak, 1);
        assert_eq!(stats.current_streak, 2);
    }

    #[tokio::test]
    async fn test_live_streak_decays_in_stats() {
        let (engine, clock, db) = setup().await;
        let user = new_user(&db, "0xdecay").await;

        engine.award(&user.id, ActivityType::Checkin, 0).await.unwrap();
        clock.advance_days(1);
        engine.award(&user.id, ActivityType::Checkin, 0).await.unwrap();
        clock.advance_days(1);
        assert_eq!(engine.get_stats(&user.id).await.unwrap().current_streak, 2);
        assert_eq!(engine.preview_streak(&user.id).await.unwrap(), 3);

        clock.advance_days(1);
        let stats = engine.get_stats(&user.id).await.unwrap();
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.longest_streak, 2);
        assert_eq!(engine.preview_streak(&user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_validation_and_unknown_user() {
        let (engine, _clock, db) = setup().await;
        let user = new_user(&db, "0xval").await;

        assert!(matches!(
            engine.award(&user.id, ActivityType::Mood, -1).await,
            Err(Error::ValidationError(_))
        ));
        assert!(matches!(
            engine.award("ghost", ActivityType::Mood, 0).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(engine.get_stats("ghost").await, Err(Error::NotFound(_))));

        let fresh = engine.get_stats(&user.id).await.unwrap();
        assert_eq!(fresh.total_points, 0);
        assert_eq!(fresh.level, 1);
    }

    #[tokio::test]
    async fn test_oversized_bonus_is_rejected_without_side_effects() {
        let (engine, _clock, db) = setup().await;
        let user = new_user(&db, "0xhuge").await;

        assert!(matches!(
            engine.award(&user.id, ActivityType::Mood, i64::MAX / 50).await,
            Err(Error::ValidationError(_))
        ));
        assert!(matches!(
            engine.award(&user.id, ActivityType::Mood, i64::MAX).await,
            Err(Error::ValidationError(_))
        ));
        assert!(matches!(
            engine
                .award_best_effort(&user.id, ActivityType::Journal, i64::MAX)
                .await,
            PointsOutcome::Skipped { .. }
        ));

        assert_eq!(balance(&db, &user.id).await, 0);
        assert!(list_activity_records(db.pool(), &user.id, 10).await.unwrap().is_empty());

        // The rejected attempts did not use up today's mood award
        let result = engine.award(&user.id, ActivityType::Mood, 0).await.unwrap();
        assert_eq!(result.final_points, 10);
    }

    #[tokio::test]
    async fn test_best_effort_outcomes() {
        let (engine, _clock, db) = setup().await;
        let user = new_user(&db, "0xbest").await;

        let outcome = engine
            .award_journal_entry(&user.id, &"word ".repeat(60))
            .await;
        // 15 base + 5 length bonus
        assert_eq!(outcome.points(), 20);

        let outcome = engine.award_journal_entry(&user.id, "again").await;
        assert!(matches!(outcome, PointsOutcome::Skipped { .. }));
        assert_eq!(outcome.points(), 0);

        db.pool().close().await;
        let outcome = engine.award_best_effort(&user.id, ActivityType::Mood, 0).await;
        assert!(outcome.is_degraded());
    }

    #[tokio::test]
    async fn test_award_publishes_event() {
        let (engine, _clock, db) = setup().await;
        let user = new_user(&db, "0xevent").await;
        let mut events = engine.subscribe();

        engine.award(&user.id, ActivityType::Checkin, 0).await.unwrap();

        match events.recv().await.unwrap() {
            RewardEvent::PointsAwarded { user_id, result } => {
                assert_eq!(user_id, user.id);
                assert_eq!(result.final_points, 10);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
