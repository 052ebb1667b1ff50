//! Leaderboard source rows (users joined with their stats)

use carepoints_core::{ActivityType, Error, LeaderboardEntry, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::Sqlite;

#[derive(Debug, sqlx::FromRow)]
struct LeaderboardRow {
    id: String,
    wallet_address: String,
    name: Option<String>,
    care_points: i64,
    updated_at: DateTime<Utc>,
    level: Option<i64>,
    current_streak: Option<i64>,
    longest_streak: Option<i64>,
    total_checkins: Option<i64>,
    mood_streak: Option<i64>,
    journal_streak: Option<i64>,
    last_checkin: Option<NaiveDate>,
    last_mood: Option<NaiveDate>,
    last_journal: Option<NaiveDate>,
}

/// A stored streak counter only holds while its last day is today or yesterday
fn live(counter: Option<i64>, last_day: Option<NaiveDate>, as_of: NaiveDate) -> i64 {
    match last_day {
        Some(day) if day >= as_of - Duration::days(1) => counter.unwrap_or(0),
        _ => 0,
    }
}

impl LeaderboardRow {
    fn into_entry(self, as_of: NaiveDate) -> LeaderboardEntry {
        let name = match self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => format!("User {}", self.id.chars().take(8).collect::<String>()),
        };
        LeaderboardEntry {
            rank: 0,
            user_id: self.id,
            name,
            wallet_address: self.wallet_address,
            care_points: self.care_points,
            level: self.level.unwrap_or(1),
            current_streak: live(self.current_streak, self.last_checkin, as_of),
            longest_streak: self.longest_streak.unwrap_or(0),
            total_checkins: self.total_checkins.unwrap_or(0),
            mood_streak: live(self.mood_streak, self.last_mood, as_of),
            journal_streak: live(self.journal_streak, self.last_journal, as_of),
            // Users without stats fall back to their last profile update
            last_activity: self.last_checkin.or(Some(self.updated_at.date_naive())),
        }
    }
}

/// Top users by spendable balance, with their stats. Streaks that lapsed
/// before `as_of - 1` read as 0. Ranks are assigned in query order and must
/// be reassigned after any re-sort.
pub async fn fetch_leaderboard<'e, E>(
    executor: E,
    limit: u32,
    as_of: NaiveDate,
) -> Result<Vec<LeaderboardEntry>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows: Vec<LeaderboardRow> = sqlx::query_as(
        r#"
        SELECT u.id, u.wallet_address, u.name, u.care_points, u.updated_at,
               s.level, s.current_streak, s.longest_streak, s.total_checkins,
               s.mood_streak, s.journal_streak, s.last_checkin,
               (SELECT MAX(a.activity_date) FROM activity_records a
                WHERE a.user_id = u.id AND a.activity_type = ?) AS last_mood,
               (SELECT MAX(a.activity_date) FROM activity_records a
                WHERE a.user_id = u.id AND a.activity_type = ?) AS last_journal
        FROM users u
        LEFT JOIN user_stats s ON s.user_id = u.id
        ORDER BY u.care_points DESC, u.created_at ASC
        LIMIT ?
        "#,
    )
    .bind(ActivityType::Mood.as_str())
    .bind(ActivityType::Journal.as_str())
    .bind(limit)
    .fetch_all(executor)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let mut entry = row.into_entry(as_of);
            entry.rank = i as u32 + 1;
            entry
        })
        .collect())
}
