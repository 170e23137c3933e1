//! Domain Error Types
//!
//! Pure business-rule errors, independent of the HTTP layer and of any
//! particular store backing.

use thiserror::Error;

/// Business-rule violations and domain invariant failures.
///
/// Every variant except `Infrastructure` is a deterministic outcome of
/// input and state: it is surfaced to the caller unchanged and never
/// retried internally. `Infrastructure` is the only category where a
/// caller retry may be meaningful.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Account does not exist
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// Malformed account reference
    #[error("invalid account identifier: {0}")]
    InvalidIdentifier(String),

    /// Account creation conflict on the normalized email
    #[error("an account with email {0} already exists")]
    DuplicateEmail(String),

    /// Transfer where sender and recipient are the same account
    #[error("cannot transfer to the same account")]
    SelfTransfer,

    /// Non-positive or non-numeric amount
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Balance floor violated, including floor checks lost to a
    /// concurrent transfer that committed first
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    /// Store unavailable or aborted for reasons unrelated to business rules
    #[error("infrastructure failure: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Create an insufficient balance error
    pub fn insufficient_balance(
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    ) -> Self {
        Self::InsufficientBalance { required, available }
    }

    /// Check if this is a client error (deterministic, caller's fault)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Infrastructure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_balance_error() {
        let err = DomainError::insufficient_balance(dec!(100), dec!(50));

        assert!(err.is_client_error());
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("50"));
    }

    #[test]
    fn test_infrastructure_error_not_client() {
        let err = DomainError::Infrastructure("store down".to_string());
        assert!(!err.is_client_error());
    }
}
