//! Peer-to-peer CARE transfers and system credits

use crate::clock::Clock;
use crate::locks::UserLocks;
use carepoints_core::{
    CareTransaction, Error, Result, TransferContext, TransferKind, TransferResult,
};
use carepoints_persistence::sqlite::{
    commit, credit_care_points, debit_care_points, get_transactions, log_transaction,
    require_user, total_sent,
};
use carepoints_persistence::Database;
use std::sync::Arc;
use tracing::{info, instrument};

/// Moves spendable CARE between users. Lifetime points are never touched.
#[derive(Clone)]
pub struct TransferEngine {
    db: Database,
    clock: Arc<dyn Clock>,
    locks: Arc<UserLocks>,
    comment_reward: i64,
}

impl TransferEngine {
    pub fn new(
        db: Database,
        clock: Arc<dyn Clock>,
        locks: Arc<UserLocks>,
        comment_reward: i64,
    ) -> Self {
        Self {
            db,
            clock,
            locks,
            comment_reward,
        }
    }

    /// Debit the sender and credit the recipient in one transaction
    #[instrument(skip(self, context), fields(kind = %context.kind))]
    pub async fn transfer(
        &self,
        from_user_id: &str,
        to_user_id: &str,
        amount: i64,
        context: TransferContext,
    ) -> Result<TransferResult> {
        if amount <= 0 {
            return Err(Error::ValidationError(
                "transfer amount must be positive".to_string(),
            ));
        }
        if from_user_id == to_user_id {
            return Err(Error::SelfTransferNotAllowed);
        }
        if context.kind == TransferKind::CommentReward {
            return Err(Error::ValidationError(
                "comment rewards are system credits, not transfers".to_string(),
            ));
        }

        let _guard = self.locks.lock_pair(from_user_id, to_user_id).await;
        let mut tx = self.db.begin().await?;

        require_user(&mut *tx, from_user_id).await?;
        require_user(&mut *tx, to_user_id).await?;

        let new_sender_balance = debit_care_points(&mut tx, from_user_id, amount).await?;
        let new_recipient_balance = credit_care_points(&mut *tx, to_user_id, amount).await?;
        let transaction_id = log_transaction(
            &mut *tx,
            Some(from_user_id),
            to_user_id,
            context.post_id.as_deref(),
            context.kind,
            amount,
            context.message.as_deref(),
            self.clock.now(),
        )
        .await?;
        commit(tx).await?;

        info!(
            "{} sent {} CARE to {} ({})",
            from_user_id, amount, to_user_id, context.kind
        );

        Ok(TransferResult {
            transaction_id,
            amount,
            new_sender_balance,
            new_recipient_balance,
        })
    }

    /// Tip the author of a post
    pub async fn tip(
        &self,
        from_user_id: &str,
        author_id: &str,
        post_id: &str,
        amount: i64,
    ) -> Result<TransferResult> {
        self.transfer(from_user_id, author_id, amount, TransferContext::tip(post_id))
            .await
    }

    /// "Send CARE" interaction on a post
    pub async fn send_care(
        &self,
        from_user_id: &str,
        author_id: &str,
        post_id: &str,
        amount: i64,
    ) -> Result<TransferResult> {
        self.transfer(
            from_user_id,
            author_id,
            amount,
            TransferContext::send_care(post_id, amount),
        )
        .await
    }

    /// Credit a user with no sender. Returns the new balance.
    pub async fn credit(
        &self,
        user_id: &str,
        amount: i64,
        context: TransferContext,
    ) -> Result<i64> {
        if amount <= 0 {
            return Err(Error::ValidationError(
                "credit amount must be positive".to_string(),
            ));
        }

        let _guard = self.locks.lock(user_id).await;
        let mut tx = self.db.begin().await?;

        let balance = credit_care_points(&mut *tx, user_id, amount).await?;
        log_transaction(
            &mut *tx,
            None,
            user_id,
            context.post_id.as_deref(),
            context.kind,
            amount,
            context.message.as_deref(),
            self.clock.now(),
        )
        .await?;
        commit(tx).await?;

        info!("Credited {} CARE to {} ({})", amount, user_id, context.kind);
        Ok(balance)
    }

    /// Fixed reward for commenting on a post
    pub async fn reward_comment(&self, user_id: &str, post_id: &str) -> Result<i64> {
        let context = TransferContext {
            kind: TransferKind::CommentReward,
            post_id: Some(post_id.to_string()),
            message: Some("Comment reward".to_string()),
        };
        self.credit(user_id, self.comment_reward, context).await
    }

    /// Sent and received transactions, newest first
    pub async fn history(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
        kind: Option<TransferKind>,
    ) -> Result<Vec<CareTransaction>> {
        get_transactions(self.db.pool(), user_id, limit, offset, kind).await
    }

    /// CARE this user has given away to others
    pub async fn total_sent(&self, user_id: &str) -> Result<i64> {
        total_sent(self.db.pool(), user_id).await
    }
}
