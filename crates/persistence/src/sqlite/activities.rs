//! Activity record persistence (append-only audit log)

use carepoints_core::{ActivityRecord, ActivityType, Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Sqlite;

#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: i64,
    user_id: String,
    activity_type: String,
    activity_date: NaiveDate,
    created_at: DateTime<Utc>,
    points_earned: i64,
    streak_days: i64,
}

impl TryFrom<ActivityRow> for ActivityRecord {
    type Error = Error;

    fn try_from(row: ActivityRow) -> Result<Self> {
        Ok(ActivityRecord {
            id: row.id,
            user_id: row.user_id,
            activity_type: row.activity_type.parse()?,
            activity_date: row.activity_date,
            created_at: row.created_at,
            points_earned: row.points_earned,
            streak_days: row.streak_days,
        })
    }
}

/// Append an activity record. The activity date is the UTC day of `created_at`.
pub async fn insert_activity_record<'e, E>(
    executor: E,
    user_id: &str,
    activity_type: ActivityType,
    created_at: DateTime<Utc>,
    points_earned: i64,
    streak_days: i64,
) -> Result<ActivityRecord>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let activity_date = created_at.date_naive();
    let result = sqlx::query(
        r#"
        INSERT INTO activity_records (user_id, activity_type, activity_date, created_at,
                                      points_earned, streak_days)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(activity_type.as_str())
    .bind(activity_date)
    .bind(created_at)
    .bind(points_earned)
    .bind(streak_days)
    .execute(executor)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(ActivityRecord {
        id: result.last_insert_rowid(),
        user_id: user_id.to_string(),
        activity_type,
        activity_date,
        created_at,
        points_earned,
        streak_days,
    })
}

/// Count records of one type on one UTC day
pub async fn count_activities_on<'e, E>(
    executor: E,
    user_id: &str,
    activity_type: ActivityType,
    date: NaiveDate,
) -> Result<u32>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM activity_records
        WHERE user_id = ? AND activity_type = ? AND activity_date = ?
        "#,
    )
    .bind(user_id)
    .bind(activity_type.as_str())
    .bind(date)
    .fetch_one(executor)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(row.0 as u32)
}

/// Distinct days in `[from, to]` with at least one record of the given types,
/// newest first
pub async fn activity_days<'e, E>(
    executor: E,
    user_id: &str,
    types: &[ActivityType],
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<NaiveDate>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    if types.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = String::from(
        r#"
        SELECT DISTINCT activity_date FROM activity_records
        WHERE user_id = ? AND activity_date >= ? AND activity_date <= ?
        "#,
    );
    let placeholders = vec!["?"; types.len()].join(", ");
    query.push_str(&format!(" AND activity_type IN ({})", placeholders));
    query.push_str(" ORDER BY activity_date DESC");

    let mut builder = sqlx::query_as::<_, (NaiveDate,)>(&query)
        .bind(user_id)
        .bind(from)
        .bind(to);
    for activity_type in types {
        builder = builder.bind(activity_type.as_str());
    }

    let rows = builder
        .fetch_all(executor)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}

/// Most recent records for a user
pub async fn list_activity_records<'e, E>(
    executor: E,
    user_id: &str,
    limit: u32,
) -> Result<Vec<ActivityRecord>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows: Vec<ActivityRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, activity_type, activity_date, created_at, points_earned, streak_days
        FROM activity_records
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(executor)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    rows.into_iter().map(ActivityRecord::try_from).collect()
}

/// Full history for a user, oldest first
pub async fn all_activity_records<'e, E>(executor: E, user_id: &str) -> Result<Vec<ActivityRecord>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows: Vec<ActivityRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, activity_type, activity_date, created_at, points_earned, streak_days
        FROM activity_records
        WHERE user_id = ?
        ORDER BY activity_date ASC, id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    rows.into_iter().map(ActivityRecord::try_from).collect()
}
