//! Transfer engine
//!
//! Orchestrates the atomic two-account money movement: fail-fast
//! validation, then the commit protocol through a [`TransactionScope`].
//! The engine holds no locks of its own; per-account serialization is
//! delegated entirely to the store's conditional-adjust primitive and the
//! scope backing. A floor check lost to a concurrent transfer surfaces as
//! a normal `InsufficientBalance` business failure, never retried here.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Amount, DomainError, TransferRecord};
use crate::store::{AccountStore, ScopeSource};

/// A committed transfer, with both balances re-read after commit.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub record: TransferRecord,
    pub sender_balance: Decimal,
    pub recipient_balance: Decimal,
}

pub struct TransferEngine {
    accounts: Arc<dyn AccountStore>,
    scopes: Arc<dyn ScopeSource>,
}

impl TransferEngine {
    pub fn new(accounts: Arc<dyn AccountStore>, scopes: Arc<dyn ScopeSource>) -> Self {
        Self { accounts, scopes }
    }

    /// Move `amount` from `sender_id` to `recipient_id`.
    ///
    /// Either the debit, the credit and the ledger record all apply, or
    /// none do (subject to the selected scope backing's documented
    /// guarantees). No balance ever drops below zero.
    pub async fn transfer(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<TransferOutcome, DomainError> {
        // Fail-fast validation, before any mutation
        self.accounts.get(sender_id).await?;
        self.accounts.get(recipient_id).await?;

        if sender_id == recipient_id {
            return Err(DomainError::SelfTransfer);
        }

        let amount = Amount::new(amount).map_err(|e| DomainError::InvalidAmount(e.to_string()))?;

        // Commit protocol. The scope re-checks the sender's balance at the
        // debit itself, so a transfer that raced past the validation above
        // still aborts on the floor.
        let mut scope = self.scopes.begin().await?;

        let delta = amount.value();

        if let Err(e) = scope.debit(sender_id, delta).await {
            scope.rollback().await;
            return Err(e);
        }

        // Credits never violate the floor; this fails only if the
        // recipient vanished, in which case the debit is rolled back.
        if let Err(e) = scope.credit(recipient_id, delta).await {
            scope.rollback().await;
            return Err(e);
        }

        let record = TransferRecord::success(sender_id, recipient_id, amount, description);
        scope.stage_record(record.clone());
        scope.commit().await?;

        let sender_balance = self.accounts.get(sender_id).await?.balance.value();
        let recipient_balance = self.accounts.get(recipient_id).await?.balance.value();

        tracing::info!(
            transfer_id = %record.id,
            sender_id = %sender_id,
            recipient_id = %recipient_id,
            amount = %amount,
            "transfer committed"
        );

        Ok(TransferOutcome {
            record,
            sender_balance,
            recipient_balance,
        })
    }
}
