//! UserStats aggregate persistence

use carepoints_core::{Error, Result, UserStats};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Sqlite, SqliteConnection};

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    user_id: String,
    total_points: i64,
    current_streak: i64,
    longest_streak: i64,
    mood_streak: i64,
    journal_streak: i64,
    total_checkins: i64,
    level: i64,
    last_checkin: Option<NaiveDate>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<StatsRow> for UserStats {
    fn from(row: StatsRow) -> Self {
        UserStats {
            user_id: row.user_id,
            total_points: row.total_points,
            current_streak: row.current_streak,
            longest_streak: row.longest_streak,
            mood_streak: row.mood_streak,
            journal_streak: row.journal_streak,
            total_checkins: row.total_checkins,
            level: row.level,
            last_checkin: row.last_checkin,
            updated_at: row.updated_at,
        }
    }
}

/// Get stats for a user, if any activity has been recorded
pub async fn get_stats<'e, E>(executor: E, user_id: &str) -> Result<Option<UserStats>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row: Option<StatsRow> = sqlx::query_as(
        r#"
        SELECT user_id, total_points, current_streak, longest_streak, mood_streak,
               journal_streak, total_checkins, level, last_checkin, updated_at
        FROM user_stats
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(row.map(UserStats::from))
}

/// Get stats, inserting zeroed defaults on first access
pub async fn ensure_stats(conn: &mut SqliteConnection, user_id: &str) -> Result<UserStats> {
    sqlx::query(
        r#"
        INSERT INTO user_stats (user_id, total_points, current_streak, longest_streak,
                                mood_streak, journal_streak, total_checkins, level,
                                last_checkin, updated_at)
        VALUES (?, 0, 0, 0, 0, 0, 0, 1, NULL, ?)
        ON CONFLICT(user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    get_stats(&mut *conn, user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("stats for user {}", user_id)))
}

/// Write every counter of the aggregate (insert or replace)
pub async fn save_stats<'e, E>(executor: E, stats: &UserStats) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO user_stats (user_id, total_points, current_streak, longest_streak,
                                mood_streak, journal_streak, total_checkins, level,
                                last_checkin, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            total_points = excluded.total_points,
            current_streak = excluded.current_streak,
            longest_streak = excluded.longest_streak,
            mood_streak = excluded.mood_streak,
            journal_streak = excluded.journal_streak,
            total_checkins = excluded.total_checkins,
            level = excluded.level,
            last_checkin = excluded.last_checkin,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&stats.user_id)
    .bind(stats.total_points)
    .bind(stats.current_streak)
    .bind(stats.longest_streak)
    .bind(stats.mood_streak)
    .bind(stats.journal_streak)
    .bind(stats.total_checkins)
    .bind(stats.level)
    .bind(stats.last_checkin)
    .bind(Utc::now())
    .execute(executor)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}
