//! Earned badge persistence

use carepoints_core::{Badge, Error, Result};
use chrono::Utc;
use sqlx::Sqlite;

/// Check whether a user already holds a badge
pub async fn has_badge<'e, E>(executor: E, user_id: &str, badge_type: &str) -> Result<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM badges WHERE user_id = ? AND badge_type = ?")
            .bind(user_id)
            .bind(badge_type)
            .fetch_one(executor)
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(row.0 > 0)
}

/// Record a badge. Returns false if the user already had it.
pub async fn award_badge<'e, E>(executor: E, user_id: &str, badge: &Badge) -> Result<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO badges (user_id, badge_type, title, description, awarded_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(user_id, badge_type) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(&badge.badge_type)
    .bind(&badge.title)
    .bind(&badge.description)
    .bind(Utc::now())
    .execute(executor)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected() > 0)
}

/// All badges a user holds
pub async fn list_badges<'e, E>(executor: E, user_id: &str) -> Result<Vec<Badge>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT badge_type, title, description FROM badges WHERE user_id = ? ORDER BY awarded_at, badge_type",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(rows
        .into_iter()
        .map(|(badge_type, title, description)| Badge {
            badge_type,
            title,
            description,
        })
        .collect())
}
