//! User-related models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A ledger participant, created on first wallet connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Always stored lower-cased
    pub wallet_address: String,
    pub name: Option<String>,
    /// Spendable balance (tips, send-care, comment rewards, awards)
    pub care_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Display name, falling back to a shortened id
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("User {}", self.id.chars().take(8).collect::<String>()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback() {
        let mut user = User {
            id: "4f9c2a10-77aa-4c1e-9d0b-3b8e2f6b1a55".to_string(),
            wallet_address: "0xabc".to_string(),
            name: None,
            care_points: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(user.display_name(), "User 4f9c2a10");

        user.name = Some("   ".to_string());
        assert_eq!(user.display_name(), "User 4f9c2a10");

        user.name = Some("Robin".to_string());
        assert_eq!(user.display_name(), "Robin");
    }
}
