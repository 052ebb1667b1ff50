//! Notarization contract: only a one-way hash of the content leaves the ledger

use async_trait::async_trait;
use carepoints_core::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

/// What gets written on-chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotarizationRequest {
    /// Hex SHA-256 of the content
    pub content_hash: String,
    pub emotional_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotarizationReceipt {
    pub tx_hash: String,
}

/// Downstream collaborator that records a hash and returns a transaction id
#[async_trait]
pub trait Notarizer: Send + Sync {
    async fn notarize(&self, request: &NotarizationRequest) -> Result<NotarizationReceipt>;
}

/// Lowercase hex SHA-256 of the UTF-8 content
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Hash a gratitude note and submit it with its emotional tag
#[instrument(skip(notarizer, content))]
pub async fn notarize_gratitude(
    notarizer: &dyn Notarizer,
    user_id: &str,
    content: &str,
    emotional_tag: &str,
) -> Result<NotarizationReceipt> {
    if user_id.trim().is_empty() || content.trim().is_empty() || emotional_tag.trim().is_empty() {
        return Err(Error::ValidationError(
            "user, content and emotional tag are required".to_string(),
        ));
    }

    let request = NotarizationRequest {
        content_hash: content_hash(content),
        emotional_tag: emotional_tag.trim().to_string(),
    };
    info!(
        "Notarizing gratitude for {} (hash {}...)",
        user_id,
        &request.content_hash[..10]
    );

    let receipt = notarizer.notarize(&request).await?;
    info!("Gratitude notarized, tx {}", receipt.tx_hash);
    Ok(receipt)
}
