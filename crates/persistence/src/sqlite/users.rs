//! User CRUD and atomic balance mutations

use carepoints_core::{Error, Result, User};
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqliteConnection};

/// Database row for a user
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    wallet_address: String,
    name: Option<String>,
    care_points: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            wallet_address: row.wallet_address,
            name: row.name,
            care_points: row.care_points,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, wallet_address, name, care_points, created_at, updated_at";

/// Get the user for a wallet, creating one on first connection
pub async fn get_or_create_user_by_wallet(
    conn: &mut SqliteConnection,
    wallet_address: &str,
    name: Option<&str>,
) -> Result<User> {
    let wallet = wallet_address.trim().to_lowercase();
    if wallet.is_empty() {
        return Err(Error::ValidationError("wallet address is required".to_string()));
    }

    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO users (id, wallet_address, name, care_points, created_at, updated_at)
        VALUES (?, ?, ?, 0, ?, ?)
        ON CONFLICT(wallet_address) DO NOTHING
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&wallet)
    .bind(name)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    get_user_by_wallet(&mut *conn, &wallet)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user with wallet {}", wallet)))
}

/// Get a user by ID
pub async fn get_user<'e, E>(executor: E, id: &str) -> Result<Option<User>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(row.map(User::from))
}

/// Get a user by ID, failing with `NotFound` if absent
pub async fn require_user<'e, E>(executor: E, id: &str) -> Result<User>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    get_user(executor, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {}", id)))
}

/// Get a user by wallet address (case-insensitive)
pub async fn get_user_by_wallet<'e, E>(executor: E, wallet_address: &str) -> Result<Option<User>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row: Option<UserRow> = sqlx::query_as(&format!(
        "SELECT {} FROM users WHERE wallet_address = ?",
        USER_COLUMNS
    ))
    .bind(wallet_address.trim().to_lowercase())
    .fetch_optional(executor)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(row.map(User::from))
}

/// Update a user's display name
pub async fn set_user_name<'e, E>(executor: E, id: &str, name: &str) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE users SET name = ?, updated_at = ? WHERE id = ?")
        .bind(name.trim())
        .bind(Utc::now())
        .bind(id)
        .execute(executor)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("user {}", id)));
    }
    Ok(())
}

/// Atomically add to a user's spendable balance. Returns the new balance.
pub async fn credit_care_points<'e, E>(executor: E, id: &str, amount: i64) -> Result<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        UPDATE users
        SET care_points = care_points + ?, updated_at = ?
        WHERE id = ?
        RETURNING care_points
        "#,
    )
    .bind(amount)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(executor)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    row.map(|r| r.0)
        .ok_or_else(|| Error::NotFound(format!("user {}", id)))
}

/// Atomically subtract from a user's balance, only if it stays non-negative.
/// Returns the new balance.
pub async fn debit_care_points(
    conn: &mut SqliteConnection,
    id: &str,
    amount: i64,
) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        UPDATE users
        SET care_points = care_points - ?, updated_at = ?
        WHERE id = ? AND care_points >= ?
        RETURNING care_points
        "#,
    )
    .bind(amount)
    .bind(Utc::now())
    .bind(id)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    match row {
        Some((balance,)) => Ok(balance),
        None => {
            let user = require_user(&mut *conn, id).await?;
            Err(Error::InsufficientBalance {
                required: amount,
                available: user.care_points,
            })
        }
    }
}
