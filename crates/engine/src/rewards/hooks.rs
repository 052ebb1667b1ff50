use carepoints_core::{AwardResult, Badge};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Published after the ledger commits; subscribers own any side effects
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RewardEvent {
    PointsAwarded {
        user_id: String,
        result: AwardResult,
    },
    /// A check-in shared its gratitude note publicly
    PublicGratitude {
        user_id: String,
        date: NaiveDate,
        gratitude: String,
        mood_label: String,
    },
    BadgeEarned {
        user_id: String,
        badge: Badge,
    },
}

impl RewardEvent {
    pub fn user_id(&self) -> &str {
        match self {
            RewardEvent::PointsAwarded { user_id, .. }
            | RewardEvent::PublicGratitude { user_id, .. }
            | RewardEvent::BadgeEarned { user_id, .. } => user_id,
        }
    }
}

/// Subscriber for reward events
pub trait RewardHook: Send + Sync {
    fn on_event(&self, event: &RewardEvent);
}

/// Drive a hook from a subscription until the sender is dropped
pub fn spawn_hook(
    mut events: broadcast::Receiver<RewardEvent>,
    hook: Arc<dyn RewardHook>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => hook.on_event(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Reward hook lagged, {} events dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Reward event channel closed");
                    break;
                }
            }
        }
    })
}
