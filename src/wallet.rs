//! Wallet facade
//!
//! Thin composition layer the HTTP boundary talks to. Parses string
//! identifiers into typed ids and delegates everything else; all error
//! kinds surface unchanged from the stores and the engine.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Account, DomainError, TransferRecord};
use crate::engine::{TransferEngine, TransferOutcome};
use crate::store::{AccountStore, LedgerStore};

/// Default history page size when the caller gives no limit
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

pub struct WalletFacade {
    accounts: Arc<dyn AccountStore>,
    ledger: Arc<dyn LedgerStore>,
    engine: TransferEngine,
}

fn parse_account_id(raw: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw).map_err(|_| DomainError::InvalidIdentifier(raw.to_string()))
}

impl WalletFacade {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        ledger: Arc<dyn LedgerStore>,
        engine: TransferEngine,
    ) -> Self {
        Self {
            accounts,
            ledger,
            engine,
        }
    }

    pub async fn create_account(
        &self,
        name: &str,
        email: &str,
        initial_balance: Option<Decimal>,
    ) -> Result<Account, DomainError> {
        self.accounts.create(name, email, initial_balance).await
    }

    pub async fn get_balance(&self, account_id: &str) -> Result<Account, DomainError> {
        let id = parse_account_id(account_id)?;
        self.accounts.get(id).await
    }

    pub async fn transfer(
        &self,
        sender_id: &str,
        recipient_id: &str,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<TransferOutcome, DomainError> {
        let sender = parse_account_id(sender_id)?;
        let recipient = parse_account_id(recipient_id)?;
        self.engine.transfer(sender, recipient, amount, description).await
    }

    pub async fn get_history(
        &self,
        account_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<TransferRecord>, DomainError> {
        let id = parse_account_id(account_id)?;
        // History of a nonexistent account is NotFound, not an empty list
        self.accounts.get(id).await?;
        self.ledger
            .find_by_participant(id, limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
            .await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, DomainError> {
        self.accounts.list().await
    }
}
