//! CarePoints Engine - Streaks, rewards, transfers, and leaderboard ranking

pub mod clock;
pub mod config;
pub mod leaderboard;
pub mod locks;
pub mod policy;
pub mod rewards;
pub mod streak;
pub mod transfer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{load_rewards_config, save_rewards_config, ActivityRule, RewardsConfig};
pub use leaderboard::LeaderboardService;
pub use locks::UserLocks;
pub use rewards::{spawn_hook, CheckinService, RewardEvent, RewardHook, RewardsEngine};
pub use transfer::TransferEngine;

use carepoints_core::{Result, User};
use carepoints_persistence::cache::LeaderboardCache;
use carepoints_persistence::sqlite::{get_or_create_user_by_wallet, require_user, set_user_name};
use carepoints_persistence::Database;
use std::sync::Arc;

/// All ledger services over one database, sharing a clock and lock registry
#[derive(Clone)]
pub struct Ledger {
    pub rewards: RewardsEngine,
    pub checkins: CheckinService,
    pub transfers: TransferEngine,
    pub leaderboard: LeaderboardService,
}

impl Ledger {
    pub fn new(db: Database, config: RewardsConfig, clock: Arc<dyn Clock>) -> Self {
        let locks = Arc::new(UserLocks::new());
        let transfers = TransferEngine::new(
            db.clone(),
            clock.clone(),
            locks.clone(),
            config.comment_reward,
        );
        let leaderboard = LeaderboardService::new(
            db.clone(),
            clock.clone(),
            Arc::new(LeaderboardCache::default()),
        );
        let rewards = RewardsEngine::new(db, config, clock, locks);
        let checkins = CheckinService::new(rewards.clone());

        Self {
            rewards,
            checkins,
            transfers,
            leaderboard,
        }
    }

    /// Build with the persisted rewards config and the system clock
    pub async fn open(db: Database) -> Result<Self> {
        let config = load_rewards_config(&db).await?;
        Ok(Self::new(db, config, Arc::new(SystemClock)))
    }

    pub fn database(&self) -> &Database {
        self.rewards.database()
    }

    /// Look up or create the user behind a wallet, renaming if a new name is given
    pub async fn register_user(&self, wallet_address: &str, name: Option<&str>) -> Result<User> {
        let mut conn = self
            .database()
            .pool()
            .acquire()
            .await
            .map_err(|e| carepoints_core::Error::DatabaseError(e.to_string()))?;
        let user = get_or_create_user_by_wallet(&mut conn, wallet_address, name).await?;

        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) if user.name.as_deref() != Some(name) => {
                set_user_name(&mut *conn, &user.id, name).await?;
                require_user(&mut *conn, &user.id).await
            }
            _ => Ok(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carepoints_core::{ActivityType, Error, LeaderboardCategory, LeaderboardPeriod};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_award_then_spend() {
        let db = Database::connect_in_memory().await.unwrap();
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 8, 5, 7, 0, 0).unwrap()));
        let ledger = Ledger::new(db, RewardsConfig::default(), clock);

        let alice = ledger.register_user("0xAlice", Some("Alice")).await.unwrap();
        let bob = ledger.register_user("0xBob", None).await.unwrap();
        let renamed = ledger.register_user("0xbob", Some("Bob")).await.unwrap();
        assert_eq!(renamed.id, bob.id);
        assert_eq!(renamed.display_name(), "Bob");

        ledger.rewards.award(&alice.id, ActivityType::Journal, 0).await.unwrap();
        ledger.rewards.award(&alice.id, ActivityType::Mood, 0).await.unwrap();
        assert_eq!(ledger.rewards.get_stats(&alice.id).await.unwrap().total_points, 25);

        ledger.transfers.tip(&alice.id, &bob.id, "post-1", 20).await.unwrap();

        // Spending leaves lifetime points alone
        let stats = ledger.rewards.get_stats(&alice.id).await.unwrap();
        assert_eq!(stats.total_points, 25);
        assert!(matches!(
            ledger.transfers.tip(&alice.id, &bob.id, "post-1", 6).await,
            Err(Error::InsufficientBalance { required: 6, available: 5 })
        ));

        let board = ledger
            .leaderboard
            .top(LeaderboardCategory::Overall, LeaderboardPeriod::AllTime, 10)
            .await
            .unwrap();
        assert_eq!(board[0].user_id, bob.id);
        assert_eq!(board[0].care_points, 20);
        assert_eq!(board[1].care_points, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_users_on_file_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::connect(&dir.path().join("carepoints.db")).await.unwrap();
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 8, 5, 7, 0, 0).unwrap()));
        let ledger = Ledger::new(db, RewardsConfig::default(), clock);

        let mut users = Vec::new();
        for i in 0..40 {
            users.push(ledger.register_user(&format!("0xuser{}", i), None).await.unwrap());
        }

        let mut handles = Vec::new();
        for user in &users {
            for activity in [ActivityType::Mood, ActivityType::Journal, ActivityType::Checkin] {
                let ledger = ledger.clone();
                let user_id = user.id.clone();
                handles.push(tokio::spawn(async move {
                    ledger.rewards.award(&user_id, activity, 0).await
                }));
            }
        }

        let mut failures = Vec::new();
        for handle in handles {
            if let Err(e) = handle.await.unwrap() {
                failures.push(e.to_string());
            }
        }
        assert!(failures.is_empty(), "failed awards: {:?}", failures);

        // 10 + 15 + 10 at streak 1 for everyone
        for user in &users {
            let stats = ledger.rewards.get_stats(&user.id).await.unwrap();
            assert_eq!(stats.total_points, 35);
            assert_eq!(stats.total_checkins, 1);
        }
    }

    #[tokio::test]
    async fn test_streak_board_ignores_lapsed_runs() {
        let db = Database::connect_in_memory().await.unwrap();
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()));
        let ledger = Ledger::new(db, RewardsConfig::default(), clock.clone());

        let veteran = ledger.register_user("0xveteran", None).await.unwrap();
        let newcomer = ledger.register_user("0xnewcomer", None).await.unwrap();

        for _ in 0..5 {
            ledger.rewards.award(&veteran.id, ActivityType::Mood, 0).await.unwrap();
            clock.advance_days(1);
        }
        clock.advance_days(30);
        ledger.rewards.award(&newcomer.id, ActivityType::Mood, 0).await.unwrap();
        clock.advance_days(1);
        ledger.rewards.award(&newcomer.id, ActivityType::Mood, 0).await.unwrap();

        for category in [LeaderboardCategory::Streak, LeaderboardCategory::MoodStreak] {
            let board = ledger
                .leaderboard
                .top(category, LeaderboardPeriod::AllTime, 10)
                .await
                .unwrap();
            assert_eq!(board[0].user_id, newcomer.id, "{:?}", category);
            assert_eq!(category_streaks(&board[0], category), 2);
            assert_eq!(board[1].user_id, veteran.id);
            assert_eq!(category_streaks(&board[1], category), 0);
            assert_eq!(board[1].longest_streak, 5);
        }
    }

    fn category_streaks(entry: &carepoints_core::LeaderboardEntry, category: LeaderboardCategory) -> i64 {
        match category {
            LeaderboardCategory::MoodStreak => entry.mood_streak,
            _ => entry.current_streak,
        }
    }

    #[tokio::test]
    async fn test_open_uses_persisted_config() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut config = RewardsConfig::default();
        config.comment_reward = 3;
        save_rewards_config(&db, &config).await.unwrap();

        let ledger = Ledger::open(db).await.unwrap();
        let user = ledger.register_user("0xc", None).await.unwrap();
        assert_eq!(ledger.transfers.reward_comment(&user.id, "p").await.unwrap(), 3);
    }
}
