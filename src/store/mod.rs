//! Storage contracts
//!
//! The engine talks to storage exclusively through these traits. The
//! conditional-adjust primitive on [`AccountStore`] is the linchpin against
//! race conditions: the balance floor check and the balance mutation happen
//! as one indivisible step, never as separate read-then-write calls.

pub mod memory;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::{Account, DomainError, TransferRecord};

pub use memory::{InMemoryAccounts, InMemoryLedger, InMemoryScopeSource};

/// Durable, race-safe balance storage.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create an account. Fails with `DuplicateEmail` if an account with the
    /// same normalized email exists. When `initial_balance` is `None`, the
    /// store's configured default applies; a negative value is rejected.
    async fn create(
        &self,
        name: &str,
        email: &str,
        initial_balance: Option<Decimal>,
    ) -> Result<Account, DomainError>;

    async fn get(&self, id: Uuid) -> Result<Account, DomainError>;

    /// Atomically apply `balance += delta`, but only if the resulting
    /// balance stays at or above zero. Two concurrent adjustments on the
    /// same account serialize; neither observes a stale balance.
    async fn conditional_adjust(&self, id: Uuid, delta: Decimal) -> Result<Account, DomainError>;

    async fn list(&self) -> Result<Vec<Account>, DomainError>;
}

/// Append-only transfer record storage.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Durable write; fails only on infrastructure error.
    async fn append(&self, record: TransferRecord) -> Result<(), DomainError>;

    /// Records where the account appears as sender or recipient, most
    /// recent first, at most `limit` entries.
    async fn find_by_participant(
        &self,
        account_id: Uuid,
        limit: usize,
    ) -> Result<Vec<TransferRecord>, DomainError>;
}

/// A unit of work whose balance mutations and ledger append either all
/// become durably visible together or none do.
///
/// `debit` and `credit` take a positive magnitude; the scope applies the
/// sign. On any error from `debit`/`credit`/`commit` the caller must treat
/// the operation as aborted; `commit` restores prior state itself before
/// returning an error, except where the backing documents a weaker
/// guarantee.
#[async_trait]
pub trait TransactionScope: Send {
    async fn debit(&mut self, id: Uuid, amount: Decimal) -> Result<Account, DomainError>;

    async fn credit(&mut self, id: Uuid, amount: Decimal) -> Result<Account, DomainError>;

    /// Stage the ledger record to be written at commit.
    fn stage_record(&mut self, record: TransferRecord);

    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    /// Discard the scope, restoring every balance it touched.
    async fn rollback(self: Box<Self>);
}

/// Produces transaction scopes. The backing is chosen once at startup,
/// never per call.
#[async_trait]
pub trait ScopeSource: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn TransactionScope>, DomainError>;
}

/// Which [`TransactionScope`] backing the service runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AtomicityMode {
    /// True multi-record atomicity: mutations and the ledger append commit
    /// or roll back as a whole.
    #[default]
    Transactional,
    /// Built purely from per-account conditional-adjust with compensating
    /// rollback. Accepts a narrow window where a debit+credit pair can
    /// complete without its ledger record.
    Fallback,
}

impl FromStr for AtomicityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "transactional" => Ok(Self::Transactional),
            "fallback" => Ok(Self::Fallback),
            other => Err(format!("unknown atomicity mode: {other}")),
        }
    }
}
