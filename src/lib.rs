//! ledgerd Library
//!
//! Re-exports modules for integration testing and external use.

use std::sync::Arc;

use rust_decimal::Decimal;

pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod store;
pub mod wallet;

pub use config::Config;
pub use domain::{Account, Amount, Balance, DomainError, TransferRecord, TransferStatus};
pub use error::{AppError, AppResult};
pub use wallet::WalletFacade;

use engine::TransferEngine;
use store::{
    AccountStore, AtomicityMode, InMemoryAccounts, InMemoryLedger, InMemoryScopeSource,
    LedgerStore, ScopeSource,
};

/// Wire up stores, engine and facade over the in-memory backing.
///
/// This is the single construction point: stores and engine are built once
/// and passed by handle, with no process-wide mutable state. The atomicity
/// mode is fixed here for the facade's lifetime.
pub fn build_wallet(default_initial_balance: Decimal, mode: AtomicityMode) -> Arc<WalletFacade> {
    let accounts = Arc::new(InMemoryAccounts::new(default_initial_balance));
    let ledger = Arc::new(InMemoryLedger::new());
    let scopes = Arc::new(InMemoryScopeSource::new(
        Arc::clone(&accounts),
        Arc::clone(&ledger) as Arc<dyn LedgerStore>,
        mode,
    ));

    let engine = TransferEngine::new(
        Arc::clone(&accounts) as Arc<dyn AccountStore>,
        scopes as Arc<dyn ScopeSource>,
    );

    Arc::new(WalletFacade::new(
        accounts as Arc<dyn AccountStore>,
        ledger as Arc<dyn LedgerStore>,
        engine,
    ))
}
