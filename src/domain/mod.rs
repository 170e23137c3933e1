//! Domain module
//!
//! Core domain types and business rules.

pub mod account;
pub mod error;
pub mod money;
pub mod transfer;

pub use account::Account;
pub use error::DomainError;
pub use money::{Amount, Balance, MoneyError, MONEY_SCALE};
pub use transfer::{TransferRecord, TransferStatus, MAX_DESCRIPTION_LEN};
