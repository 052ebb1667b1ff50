//! Daily check-in persistence, one row per user per UTC day

use carepoints_core::{DailyCheckin, Error, Result};
use chrono::NaiveDate;
use sqlx::Sqlite;

#[derive(Debug, sqlx::FromRow)]
struct CheckinRow {
    user_id: String,
    date: NaiveDate,
    mood: i64,
    mood_label: String,
    notes: String,
    gratitude_note: String,
    emotions: String,
    points: i64,
    streak: i64,
}

impl TryFrom<CheckinRow> for DailyCheckin {
    type Error = Error;

    fn try_from(row: CheckinRow) -> Result<Self> {
        let mood = u8::try_from(row.mood)
            .map_err(|_| Error::InvalidData(format!("mood out of range: {}", row.mood)))?;
        Ok(DailyCheckin {
            user_id: row.user_id,
            date: row.date,
            mood,
            mood_label: row.mood_label,
            notes: row.notes,
            gratitude_note: row.gratitude_note,
            emotions: serde_json::from_str(&row.emotions)?,
            points: row.points,
            streak: row.streak,
        })
    }
}

/// Insert or replace the user's check-in for its day
pub async fn upsert_checkin<'e, E>(executor: E, checkin: &DailyCheckin) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let emotions = serde_json::to_string(&checkin.emotions)?;

    sqlx::query(
        r#"
        INSERT INTO daily_checkins (user_id, date, mood, mood_label, notes, gratitude_note,
                                    emotions, points, streak)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, date) DO UPDATE SET
            mood = excluded.mood,
            mood_label = excluded.mood_label,
            notes = excluded.notes,
            gratitude_note = excluded.gratitude_note,
            emotions = excluded.emotions,
            points = excluded.points,
            streak = excluded.streak
        "#,
    )
    .bind(&checkin.user_id)
    .bind(checkin.date)
    .bind(checkin.mood as i64)
    .bind(&checkin.mood_label)
    .bind(&checkin.notes)
    .bind(&checkin.gratitude_note)
    .bind(emotions)
    .bind(checkin.points)
    .bind(checkin.streak)
    .execute(executor)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

/// Get a user's check-in for a given day
pub async fn get_checkin<'e, E>(
    executor: E,
    user_id: &str,
    date: NaiveDate,
) -> Result<Option<DailyCheckin>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row: Option<CheckinRow> = sqlx::query_as(
        r#"
        SELECT user_id, date, mood, mood_label, notes, gratitude_note, emotions, points, streak
        FROM daily_checkins
        WHERE user_id = ? AND date = ?
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(executor)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    row.map(DailyCheckin::try_from).transpose()
}
