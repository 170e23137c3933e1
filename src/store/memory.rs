//! In-memory store backing
//!
//! Account state lives in a single map behind a `tokio::sync::RwLock`.
//! `conditional_adjust` performs its floor check and mutation under the
//! write lock, which serializes all adjustments touching the store. The
//! transactional scope takes the same lock as an owned guard and holds it
//! for the scope's whole lifetime, which is what makes its multi-record
//! commit atomic with respect to every other adjustment.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

use crate::domain::{Account, Balance, DomainError, MoneyError, TransferRecord};

use super::{AccountStore, AtomicityMode, LedgerStore, ScopeSource, TransactionScope};

#[derive(Debug, Default)]
struct AccountsInner {
    by_id: HashMap<Uuid, Account>,
    /// Lowercased email -> account id
    email_index: HashMap<String, Uuid>,
}

/// The one place a balance changes. Floor check and mutation happen under
/// the caller's exclusive access to the map.
fn apply_delta(inner: &mut AccountsInner, id: Uuid, delta: Decimal) -> Result<Account, DomainError> {
    let account = inner
        .by_id
        .get_mut(&id)
        .ok_or_else(|| DomainError::AccountNotFound(id.to_string()))?;

    let next = account.balance.checked_adjust(delta).map_err(|e| match e {
        MoneyError::Negative(_) => {
            DomainError::insufficient_balance(delta.abs(), account.balance.value())
        }
        other => DomainError::InvalidAmount(other.to_string()),
    })?;

    account.balance = next;
    account.updated_at = Utc::now();
    Ok(account.clone())
}

/// In-memory [`AccountStore`].
pub struct InMemoryAccounts {
    inner: Arc<RwLock<AccountsInner>>,
    default_initial_balance: Decimal,
}

impl InMemoryAccounts {
    pub fn new(default_initial_balance: Decimal) -> Self {
        Self {
            inner: Arc::new(RwLock::new(AccountsInner::default())),
            default_initial_balance,
        }
    }
}

#[async_trait]
impl AccountStore for InMemoryAccounts {
    async fn create(
        &self,
        name: &str,
        email: &str,
        initial_balance: Option<Decimal>,
    ) -> Result<Account, DomainError> {
        let initial = initial_balance.unwrap_or(self.default_initial_balance);
        let balance =
            Balance::new(initial).map_err(|e| DomainError::InvalidAmount(e.to_string()))?;

        let normalized = email.to_lowercase();
        let mut inner = self.inner.write().await;

        if inner.email_index.contains_key(&normalized) {
            return Err(DomainError::DuplicateEmail(normalized));
        }

        let account = Account::new(name, email, balance);
        inner.email_index.insert(normalized, account.id);
        inner.by_id.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get(&self, id: Uuid) -> Result<Account, DomainError> {
        let inner = self.inner.read().await;
        inner
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::AccountNotFound(id.to_string()))
    }

    async fn conditional_adjust(&self, id: Uuid, delta: Decimal) -> Result<Account, DomainError> {
        let mut inner = self.inner.write().await;
        apply_delta(&mut inner, id, delta)
    }

    async fn list(&self) -> Result<Vec<Account>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner.by_id.values().cloned().collect())
    }
}

/// In-memory append-only [`LedgerStore`].
#[derive(Default)]
pub struct InMemoryLedger {
    inner: RwLock<Vec<TransferRecord>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn append(&self, record: TransferRecord) -> Result<(), DomainError> {
        self.inner.write().await.push(record);
        Ok(())
    }

    async fn find_by_participant(
        &self,
        account_id: Uuid,
        limit: usize,
    ) -> Result<Vec<TransferRecord>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner
            .iter()
            .rev()
            .filter(|r| r.involves(account_id))
            .take(limit)
            .cloned()
            .collect())
    }
}

/// [`ScopeSource`] over the in-memory stores, with the backing fixed at
/// construction.
pub struct InMemoryScopeSource {
    accounts: Arc<InMemoryAccounts>,
    ledger: Arc<dyn LedgerStore>,
    mode: AtomicityMode,
}

impl InMemoryScopeSource {
    pub fn new(
        accounts: Arc<InMemoryAccounts>,
        ledger: Arc<dyn LedgerStore>,
        mode: AtomicityMode,
    ) -> Self {
        Self {
            accounts,
            ledger,
            mode,
        }
    }
}

#[async_trait]
impl ScopeSource for InMemoryScopeSource {
    async fn begin(&self) -> Result<Box<dyn TransactionScope>, DomainError> {
        match self.mode {
            AtomicityMode::Transactional => Ok(Box::new(LockedScope {
                guard: self.accounts.inner.clone().write_owned().await,
                ledger: Arc::clone(&self.ledger),
                undo: Vec::new(),
                staged: None,
            })),
            AtomicityMode::Fallback => Ok(Box::new(CompensatingScope {
                accounts: Arc::clone(&self.accounts) as Arc<dyn AccountStore>,
                ledger: Arc::clone(&self.ledger),
                applied: Vec::new(),
                staged: None,
            })),
        }
    }
}

/// Transactional backing: holds the account map's write guard from `begin`
/// to `commit`/`rollback`, so nothing else can observe or interleave with
/// the scope's mutations. The ledger append happens at commit while the
/// guard is still held.
struct LockedScope {
    guard: OwnedRwLockWriteGuard<AccountsInner>,
    ledger: Arc<dyn LedgerStore>,
    /// Inverse deltas, applied in reverse on rollback
    undo: Vec<(Uuid, Decimal)>,
    staged: Option<TransferRecord>,
}

impl LockedScope {
    fn undo_all(&mut self) {
        for (id, delta) in self.undo.drain(..).rev() {
            // Restores a value the scope itself wrote while holding the
            // guard, so the floor check cannot fail here.
            if let Err(e) = apply_delta(&mut self.guard, id, delta) {
                tracing::error!(account_id = %id, error = %e, "rollback failed to restore balance");
            }
        }
    }
}

#[async_trait]
impl TransactionScope for LockedScope {
    async fn debit(&mut self, id: Uuid, amount: Decimal) -> Result<Account, DomainError> {
        let account = apply_delta(&mut self.guard, id, -amount)?;
        self.undo.push((id, amount));
        Ok(account)
    }

    async fn credit(&mut self, id: Uuid, amount: Decimal) -> Result<Account, DomainError> {
        let account = apply_delta(&mut self.guard, id, amount)?;
        self.undo.push((id, -amount));
        Ok(account)
    }

    fn stage_record(&mut self, record: TransferRecord) {
        self.staged = Some(record);
    }

    async fn commit(mut self: Box<Self>) -> Result<(), DomainError> {
        if let Some(record) = self.staged.take() {
            if let Err(e) = self.ledger.append(record).await {
                self.undo_all();
                return Err(e);
            }
        }
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) {
        self.undo_all();
    }
}

/// Fallback backing: built purely from the per-account conditional-adjust
/// primitive, for stores without multi-record atomicity.
///
/// Known weaker guarantee: if an infrastructure failure lands strictly
/// between the credit and the ledger append at commit, the debit+credit
/// pair stands without its record. Deployments select this mode explicitly.
struct CompensatingScope {
    accounts: Arc<dyn AccountStore>,
    ledger: Arc<dyn LedgerStore>,
    /// Deltas already applied, compensated in reverse on rollback
    applied: Vec<(Uuid, Decimal)>,
    staged: Option<TransferRecord>,
}

#[async_trait]
impl TransactionScope for CompensatingScope {
    async fn debit(&mut self, id: Uuid, amount: Decimal) -> Result<Account, DomainError> {
        let account = self.accounts.conditional_adjust(id, -amount).await?;
        self.applied.push((id, -amount));
        Ok(account)
    }

    async fn credit(&mut self, id: Uuid, amount: Decimal) -> Result<Account, DomainError> {
        let account = self.accounts.conditional_adjust(id, amount).await?;
        self.applied.push((id, amount));
        Ok(account)
    }

    fn stage_record(&mut self, record: TransferRecord) {
        self.staged = Some(record);
    }

    async fn commit(mut self: Box<Self>) -> Result<(), DomainError> {
        if let Some(record) = self.staged.take() {
            // No compensating rollback past this point: the balances are
            // already durable via conditional-adjust.
            self.ledger.append(record).await?;
        }
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) {
        for (id, delta) in self.applied.drain(..).rev() {
            if let Err(e) = self.accounts.conditional_adjust(id, -delta).await {
                tracing::warn!(account_id = %id, error = %e, "compensating rollback failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn accounts() -> InMemoryAccounts {
        InMemoryAccounts::new(dec!(100))
    }

    #[tokio::test]
    async fn test_create_uses_default_initial_balance() {
        let store = accounts();
        let account = store.create("Alice", "alice@example.com", None).await.unwrap();
        assert_eq!(account.balance.value(), dec!(100));
    }

    #[tokio::test]
    async fn test_create_duplicate_email_case_insensitive() {
        let store = accounts();
        store.create("Alice", "alice@example.com", None).await.unwrap();

        let err = store
            .create("Other Alice", "ALICE@Example.COM", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateEmail(_)));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_negative_initial_balance_rejected() {
        let store = accounts();
        let err = store
            .create("Alice", "alice@example.com", Some(dec!(-1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidAmount(_)));
    }

    #[tokio::test]
    async fn test_conditional_adjust_floor() {
        let store = accounts();
        let account = store
            .create("Alice", "alice@example.com", Some(dec!(50)))
            .await
            .unwrap();

        let err = store.conditional_adjust(account.id, dec!(-50.01)).await.unwrap_err();
        assert!(matches!(err, DomainError::InsufficientBalance { .. }));

        // Exactly down to zero is allowed
        let account = store.conditional_adjust(account.id, dec!(-50)).await.unwrap();
        assert_eq!(account.balance.value(), dec!(0));
    }

    #[tokio::test]
    async fn test_conditional_adjust_rounds_to_two_digits() {
        let store = accounts();
        let account = store
            .create("Alice", "alice@example.com", Some(dec!(10)))
            .await
            .unwrap();

        let account = store.conditional_adjust(account.id, dec!(0.005)).await.unwrap();
        assert_eq!(account.balance.value(), dec!(10.01));
    }

    #[tokio::test]
    async fn test_conditional_adjust_respects_maximum_balance() {
        let store = accounts();
        let account = store
            .create("Alice", "alice@example.com", Some(dec!(999999999999)))
            .await
            .unwrap();

        let err = store.conditional_adjust(account.id, dec!(2)).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidAmount(_)));

        // Unchanged on failure
        assert_eq!(
            store.get(account.id).await.unwrap().balance.value(),
            dec!(999999999999)
        );
    }

    #[tokio::test]
    async fn test_conditional_adjust_unknown_account() {
        let store = accounts();
        let err = store.conditional_adjust(Uuid::new_v4(), dec!(1)).await.unwrap_err();
        assert!(matches!(err, DomainError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn test_ledger_most_recent_first_with_limit() {
        let ledger = InMemoryLedger::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let mut ids = Vec::new();
        for _ in 0..3 {
            let record = TransferRecord::success(
                a,
                b,
                "10.00".parse().unwrap(),
                None,
            );
            ids.push(record.id);
            ledger.append(record).await.unwrap();
        }

        let found = ledger.find_by_participant(a, 2).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, ids[2]);
        assert_eq!(found[1].id, ids[1]);

        assert!(ledger.find_by_participant(Uuid::new_v4(), 10).await.unwrap().is_empty());
    }

    async fn scope_source(mode: AtomicityMode) -> (Arc<InMemoryAccounts>, InMemoryScopeSource, Uuid, Uuid) {
        let accounts = Arc::new(InMemoryAccounts::new(dec!(100)));
        let ledger = Arc::new(InMemoryLedger::new());
        let sender = accounts.create("A", "a@example.com", None).await.unwrap();
        let recipient = accounts.create("B", "b@example.com", None).await.unwrap();
        let source = InMemoryScopeSource::new(Arc::clone(&accounts), ledger, mode);
        (accounts, source, sender.id, recipient.id)
    }

    #[tokio::test]
    async fn test_scope_rollback_restores_balances() {
        for mode in [AtomicityMode::Transactional, AtomicityMode::Fallback] {
            let (accounts, source, sender, recipient) = scope_source(mode).await;

            let mut scope = source.begin().await.unwrap();
            scope.debit(sender, dec!(40)).await.unwrap();
            scope.credit(recipient, dec!(40)).await.unwrap();
            scope.rollback().await;

            assert_eq!(accounts.get(sender).await.unwrap().balance.value(), dec!(100));
            assert_eq!(accounts.get(recipient).await.unwrap().balance.value(), dec!(100));
        }
    }

    #[tokio::test]
    async fn test_scope_commit_applies_both_sides() {
        for mode in [AtomicityMode::Transactional, AtomicityMode::Fallback] {
            let (accounts, source, sender, recipient) = scope_source(mode).await;

            let mut scope = source.begin().await.unwrap();
            scope.debit(sender, dec!(40)).await.unwrap();
            scope.credit(recipient, dec!(40)).await.unwrap();
            scope.stage_record(TransferRecord::success(
                sender,
                recipient,
                "40.00".parse().unwrap(),
                None,
            ));
            scope.commit().await.unwrap();

            assert_eq!(accounts.get(sender).await.unwrap().balance.value(), dec!(60));
            assert_eq!(accounts.get(recipient).await.unwrap().balance.value(), dec!(140));
        }
    }

    #[tokio::test]
    async fn test_scope_debit_floor_aborts() {
        for mode in [AtomicityMode::Transactional, AtomicityMode::Fallback] {
            let (accounts, source, sender, _) = scope_source(mode).await;

            let mut scope = source.begin().await.unwrap();
            let err = scope.debit(sender, dec!(1000)).await.unwrap_err();
            assert!(matches!(err, DomainError::InsufficientBalance { .. }));
            scope.rollback().await;

            assert_eq!(accounts.get(sender).await.unwrap().balance.value(), dec!(100));
        }
    }

    /// Ledger stub whose writes always fail, for driving the commit-failure
    /// paths. Reads pass through so the absence of records is observable.
    struct FailingLedger {
        inner: InMemoryLedger,
    }

    #[async_trait]
    impl LedgerStore for FailingLedger {
        async fn append(&self, _record: TransferRecord) -> Result<(), DomainError> {
            Err(DomainError::Infrastructure("ledger write refused".to_string()))
        }

        async fn find_by_participant(
            &self,
            account_id: Uuid,
            limit: usize,
        ) -> Result<Vec<TransferRecord>, DomainError> {
            self.inner.find_by_participant(account_id, limit).await
        }
    }

    async fn failing_scope_source(
        mode: AtomicityMode,
    ) -> (Arc<InMemoryAccounts>, Arc<FailingLedger>, InMemoryScopeSource, Uuid, Uuid) {
        let accounts = Arc::new(InMemoryAccounts::new(dec!(100)));
        let ledger = Arc::new(FailingLedger {
            inner: InMemoryLedger::new(),
        });
        let sender = accounts.create("A", "a@example.com", None).await.unwrap();
        let recipient = accounts.create("B", "b@example.com", None).await.unwrap();
        let source = InMemoryScopeSource::new(
            Arc::clone(&accounts),
            Arc::clone(&ledger) as Arc<dyn LedgerStore>,
            mode,
        );
        (accounts, ledger, source, sender.id, recipient.id)
    }

    #[tokio::test]
    async fn test_locked_scope_commit_failure_restores_balances() {
        let (accounts, ledger, source, sender, recipient) =
            failing_scope_source(AtomicityMode::Transactional).await;

        let mut scope = source.begin().await.unwrap();
        scope.debit(sender, dec!(40)).await.unwrap();
        scope.credit(recipient, dec!(40)).await.unwrap();
        scope.stage_record(TransferRecord::success(
            sender,
            recipient,
            "40.00".parse().unwrap(),
            None,
        ));

        let err = scope.commit().await.unwrap_err();
        assert!(matches!(err, DomainError::Infrastructure(_)));

        // Both balances back at their pre-debit values, no record visible
        assert_eq!(accounts.get(sender).await.unwrap().balance.value(), dec!(100));
        assert_eq!(accounts.get(recipient).await.unwrap().balance.value(), dec!(100));
        assert!(ledger.find_by_participant(sender, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_compensating_scope_commit_failure_keeps_moved_balances() {
        let (accounts, ledger, source, sender, recipient) =
            failing_scope_source(AtomicityMode::Fallback).await;

        let mut scope = source.begin().await.unwrap();
        scope.debit(sender, dec!(40)).await.unwrap();
        scope.credit(recipient, dec!(40)).await.unwrap();
        scope.stage_record(TransferRecord::success(
            sender,
            recipient,
            "40.00".parse().unwrap(),
            None,
        ));

        let err = scope.commit().await.unwrap_err();
        assert!(matches!(err, DomainError::Infrastructure(_)));

        // The fallback backing's documented weaker guarantee: the
        // debit+credit pair stands without its ledger record.
        assert_eq!(accounts.get(sender).await.unwrap().balance.value(), dec!(60));
        assert_eq!(accounts.get(recipient).await.unwrap().balance.value(), dec!(140));
        assert!(ledger.find_by_participant(sender, 10).await.unwrap().is_empty());
    }
}
