//! Key/value settings table (JSON values)

use carepoints_core::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::Sqlite;

/// Load a JSON setting, `None` if the key was never written
pub async fn load_setting<'e, E, T>(executor: E, key: &str) -> Result<Option<T>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
    T: DeserializeOwned,
{
    let json = sqlx::query_scalar::<Sqlite, String>("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(executor)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    match json {
        Some(j) => Ok(Some(serde_json::from_str(&j)?)),
        None => Ok(None),
    }
}

/// Save a JSON setting, replacing any previous value
pub async fn save_setting<'e, E, T>(executor: E, key: &str, value: &T) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
    T: Serialize,
{
    let json = serde_json::to_string(value)?;

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(&json)
        .execute(executor)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_setting_roundtrip_and_overwrite() {
        let db = Database::connect_in_memory().await.unwrap();

        let missing: Option<BTreeMap<String, i64>> = load_setting(db.pool(), "caps").await.unwrap();
        assert!(missing.is_none());

        let mut caps = BTreeMap::new();
        caps.insert("community".to_string(), 3);
        save_setting(db.pool(), "caps", &caps).await.unwrap();
        caps.insert("community".to_string(), 5);
        save_setting(db.pool(), "caps", &caps).await.unwrap();

        let loaded: Option<BTreeMap<String, i64>> = load_setting(db.pool(), "caps").await.unwrap();
        assert_eq!(loaded, Some(caps));
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_invalid_data() {
        let db = Database::connect_in_memory().await.unwrap();
        save_setting(db.pool(), "caps", &"not a map").await.unwrap();

        let loaded: Result<Option<BTreeMap<String, i64>>> = load_setting(db.pool(), "caps").await;
        assert!(matches!(loaded, Err(Error::InvalidData(_))));
    }
}
