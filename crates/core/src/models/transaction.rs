//! Peer transfer records

use crate::TransferKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only ledger entry for a balance movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareTransaction {
    pub id: i64,
    /// `None` for system credits (comment rewards)
    pub from_user_id: Option<String>,
    pub to_user_id: String,
    pub post_id: Option<String>,
    pub kind: TransferKind,
    pub amount: i64,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied context for a transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferContext {
    pub kind: TransferKind,
    pub post_id: Option<String>,
    pub message: Option<String>,
}

impl TransferContext {
    pub fn tip(post_id: impl Into<String>) -> Self {
        Self {
            kind: TransferKind::Tip,
            post_id: Some(post_id.into()),
            message: None,
        }
    }

    pub fn send_care(post_id: impl Into<String>, amount: i64) -> Self {
        Self {
            kind: TransferKind::SendCare,
            post_id: Some(post_id.into()),
            message: Some(format!("Sent {} CARE points for community post", amount)),
        }
    }
}

/// Balances after a successful transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub transaction_id: i64,
    pub amount: i64,
    pub new_sender_balance: i64,
    pub new_recipient_balance: i64,
}
