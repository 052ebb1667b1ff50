//! CARE transaction persistence (append-only transfer audit trail)

use carepoints_core::{CareTransaction, Error, Result, TransferKind};
use chrono::{DateTime, Utc};
use sqlx::Sqlite;

/// Transaction record stored in database
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    from_user_id: Option<String>,
    to_user_id: String,
    post_id: Option<String>,
    kind: String,
    amount: i64,
    message: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for CareTransaction {
    type Error = Error;

    fn try_from(row: TransactionRow) -> Result<Self> {
        Ok(CareTransaction {
            id: row.id,
            from_user_id: row.from_user_id,
            to_user_id: row.to_user_id,
            post_id: row.post_id,
            kind: row.kind.parse()?,
            amount: row.amount,
            message: row.message,
            created_at: row.created_at,
        })
    }
}

/// Log a new transaction
#[allow(clippy::too_many_arguments)]
pub async fn log_transaction<'e, E>(
    executor: E,
    from_user_id: Option<&str>,
    to_user_id: &str,
    post_id: Option<&str>,
    kind: TransferKind,
    amount: i64,
    message: Option<&str>,
    created_at: DateTime<Utc>,
) -> Result<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO care_transactions (from_user_id, to_user_id, post_id, kind, amount, message, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(from_user_id)
    .bind(to_user_id)
    .bind(post_id)
    .bind(kind.as_str())
    .bind(amount)
    .bind(message)
    .bind(created_at)
    .execute(executor)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.last_insert_rowid())
}

/// Transactions a user sent or received, newest first
pub async fn get_transactions<'e, E>(
    executor: E,
    user_id: &str,
    limit: u32,
    offset: u32,
    kind: Option<TransferKind>,
) -> Result<Vec<CareTransaction>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let mut query = String::from(
        r#"
        SELECT id, from_user_id, to_user_id, post_id, kind, amount, message, created_at
        FROM care_transactions
        WHERE (from_user_id = ? OR to_user_id = ?)
        "#,
    );

    if kind.is_some() {
        query.push_str(" AND kind = ?");
    }

    query.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");

    let mut builder = sqlx::query_as::<_, TransactionRow>(&query)
        .bind(user_id)
        .bind(user_id);

    if let Some(k) = kind {
        builder = builder.bind(k.as_str());
    }

    let rows = builder
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    rows.into_iter().map(CareTransaction::try_from).collect()
}

/// Total CARE a user has sent to other users
pub async fn total_sent<'e, E>(executor: E, user_id: &str) -> Result<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row: (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(amount), 0) FROM care_transactions WHERE from_user_id = ?",
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(row.0)
}
