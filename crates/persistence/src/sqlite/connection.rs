//! Database connection and initialization

use carepoints_core::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// How long a connection waits on another writer before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database wrapper for SQLite operations
///
/// Cheap to clone; every clone shares the same pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to database at the given path, creating if necessary
    pub async fn connect(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::DatabaseError(e.to_string()))?;
        }

        let path_str = path.to_string_lossy();
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path_str))
            .map_err(|e| Error::DatabaseError(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Connect to in-memory database (for testing)
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                wallet_address TEXT NOT NULL UNIQUE,
                name TEXT,
                care_points INTEGER NOT NULL DEFAULT 0 CHECK (care_points >= 0),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS user_stats (
                user_id TEXT PRIMARY KEY,
                total_points INTEGER NOT NULL DEFAULT 0,
                current_streak INTEGER NOT NULL DEFAULT 0,
                longest_streak INTEGER NOT NULL DEFAULT 0,
                mood_streak INTEGER NOT NULL DEFAULT 0,
                journal_streak INTEGER NOT NULL DEFAULT 0,
                total_checkins INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 1,
                last_checkin TEXT,
                updated_at TEXT,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS activity_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                activity_type TEXT NOT NULL,
                activity_date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                points_earned INTEGER NOT NULL,
                streak_days INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE INDEX IF NOT EXISTS idx_activity_user_type_date
                ON activity_records (user_id, activity_type, activity_date);

            CREATE TABLE IF NOT EXISTS care_transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                from_user_id TEXT,
                to_user_id TEXT NOT NULL,
                post_id TEXT,
                kind TEXT NOT NULL,
                amount INTEGER NOT NULL CHECK (amount > 0),
                message TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (from_user_id) REFERENCES users(id),
                FOREIGN KEY (to_user_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS daily_checkins (
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                mood INTEGER NOT NULL,
                mood_label TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                gratitude_note TEXT NOT NULL DEFAULT '',
                emotions TEXT NOT NULL DEFAULT '[]',
                points INTEGER NOT NULL,
                streak INTEGER NOT NULL,
                PRIMARY KEY (user_id, date),
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS badges (
                user_id TEXT NOT NULL,
                badge_type TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                awarded_at TEXT NOT NULL,
                PRIMARY KEY (user_id, badge_type),
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

        debug!("Database schema ready");
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a write transaction; dropping it without `commit` rolls back.
    ///
    /// Takes the write lock up front so a read inside the transaction never
    /// has to be upgraded, which SQLite refuses with `SQLITE_BUSY` while
    /// another connection is writing.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))
    }
}

/// Commit a transaction, mapping the driver error
pub async fn commit(tx: Transaction<'static, Sqlite>) -> Result<()> {
    tx.commit()
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))
}
