use crate::notary::{NotarizationReceipt, NotarizationRequest, Notarizer};
use async_trait::async_trait;
use carepoints_core::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument};

pub const NOTARY_URL_VAR: &str = "CAREPOINTS_NOTARY_URL";
pub const NOTARY_TOKEN_VAR: &str = "CAREPOINTS_NOTARY_TOKEN";

/// Confirmation can take a block or two
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where and how to reach the notarization relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotaryConfig {
    pub endpoint: String,
    pub token: String,
    pub timeout: Duration,
}

impl NotaryConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as missing
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::NotarizationError(format!("{} is not set", key)))
        };

        Ok(Self {
            endpoint: required(NOTARY_URL_VAR)?,
            token: required(NOTARY_TOKEN_VAR)?,
            timeout: DEFAULT_TIMEOUT,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayResponse {
    #[serde(default)]
    success: bool,
    tx_hash: Option<String>,
    error: Option<String>,
}

impl RelayResponse {
    fn into_receipt(self) -> Result<NotarizationReceipt> {
        match (self.success, self.tx_hash) {
            (true, Some(tx_hash)) if !tx_hash.is_empty() => Ok(NotarizationReceipt { tx_hash }),
            _ => Err(Error::NotarizationError(
                self.error
                    .unwrap_or_else(|| "relay returned no transaction hash".to_string()),
            )),
        }
    }
}

/// Posts hash + tag to the relay, which signs and submits the transaction
pub struct NotaryClient {
    http: Client,
    config: NotaryConfig,
}

impl NotaryClient {
    pub fn new(config: NotaryConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(NotaryConfig::from_env()?)
    }
}

#[async_trait]
impl Notarizer for NotaryClient {
    #[instrument(skip(self, request), fields(tag = %request.emotional_tag))]
    async fn notarize(&self, request: &NotarizationRequest) -> Result<NotarizationReceipt> {
        debug!("Posting notarization to {}", self.config.endpoint);

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        debug!("Relay status: {}", status);

        let body: RelayResponse = response.json().await.map_err(|e| {
            error!("Unreadable relay response ({}): {}", status, e);
            Error::NotarizationError(format!("unreadable relay response: {}", e))
        })?;

        if !status.is_success() {
            return Err(Error::NotarizationError(
                body.error.unwrap_or_else(|| format!("relay returned {}", status)),
            ));
        }

        body.into_receipt()
    }
}
