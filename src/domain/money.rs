//! Monetary value types
//!
//! Domain primitives for transfer amounts and account balances. All values
//! are validated at construction time, ensuring invalid values cannot exist
//! in the system, and every stored value carries exactly two fractional
//! digits so repeated arithmetic never accumulates drift.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum representable value (1 trillion)
const MAX_AMOUNT: Decimal = Decimal::from_parts(3567587328, 232, 0, false, 0);

/// Fixed scale for all monetary values
pub const MONEY_SCALE: u32 = 2;

/// Round to the fixed money scale, half away from zero. The result carries
/// exactly [`MONEY_SCALE`] fractional digits so serialized values are
/// stable ("70.00", never "70").
fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Errors that can occur when creating an [`Amount`] or [`Balance`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("amount must be positive (got {0})")]
    NotPositive(Decimal),

    #[error("balance must not be negative (got {0})")]
    Negative(Decimal),

    #[error("value exceeds maximum allowed ({MAX_AMOUNT})")]
    Overflow,

    #[error("invalid amount format: {0}")]
    Parse(String),
}

/// Amount represents a validated transfer amount.
///
/// # Invariants
/// - Value is strictly positive after normalization
/// - Exactly two fractional digits (round half away from zero)
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use ledgerd::domain::Amount;
///
/// let amount = Amount::new(Decimal::new(2533, 2)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(2533, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(Decimal);

impl Amount {
    /// Create a new Amount, normalizing to two fractional digits.
    ///
    /// # Errors
    /// - `MoneyError::NotPositive` if the normalized value is <= 0
    /// - `MoneyError::Overflow` if the value exceeds the maximum
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        let value = round_money(value);

        if value <= Decimal::ZERO {
            return Err(MoneyError::NotPositive(value));
        }
        if value > MAX_AMOUNT {
            return Err(MoneyError::Overflow);
        }

        Ok(Self(value))
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Amount {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s).map_err(|e| MoneyError::Parse(e.to_string()))?;
        Amount::new(decimal)
    }
}

impl TryFrom<String> for Amount {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Amount::from_str(&value)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        format!("{:.2}", amount.0)
    }
}

/// Balance represents an account balance. Unlike [`Amount`], it can be zero.
///
/// The balance floor (never negative) is enforced here and in the store's
/// conditional-adjust primitive; no other code path mutates a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance(Decimal);

impl Balance {
    /// Create a new balance (zero or positive), normalized to two digits.
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        let value = round_money(value);

        if value < Decimal::ZERO {
            return Err(MoneyError::Negative(value));
        }
        if value > MAX_AMOUNT {
            return Err(MoneyError::Overflow);
        }

        Ok(Self(value))
    }

    /// Create a zero balance
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Get the underlying value
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Apply a signed delta. The result goes through the same validation
    /// as [`Balance::new`]: it must stay at or above zero and below the
    /// maximum, and is normalized to two digits.
    pub fn checked_adjust(&self, delta: Decimal) -> Result<Balance, MoneyError> {
        Balance::new(self.0 + delta)
    }

    /// Check if the balance covers a withdrawal of `amount`.
    pub fn is_sufficient_for(&self, amount: &Amount) -> bool {
        self.0 >= amount.value()
    }

    /// Add an amount to the balance.
    pub fn credit(&self, amount: &Amount) -> Result<Balance, MoneyError> {
        Balance::new(self.0 + amount.value())
    }

    /// Subtract an amount from the balance.
    pub fn debit(&self, amount: &Amount) -> Result<Balance, MoneyError> {
        Balance::new(self.0 - amount.value())
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_positive() {
        let amount = Amount::new(dec!(100));
        assert!(amount.is_ok());
        assert_eq!(amount.unwrap().value(), dec!(100));
    }

    #[test]
    fn test_amount_zero_rejected() {
        assert!(matches!(Amount::new(Decimal::ZERO), Err(MoneyError::NotPositive(_))));
    }

    #[test]
    fn test_amount_negative_rejected() {
        assert!(matches!(Amount::new(dec!(-100)), Err(MoneyError::NotPositive(_))));
    }

    #[test]
    fn test_amount_rounds_half_away_from_zero() {
        let amount = Amount::new(dec!(10.005)).unwrap();
        assert_eq!(amount.value(), dec!(10.01));
    }

    #[test]
    fn test_amount_rounding_to_zero_rejected() {
        // 0.004 rounds down to 0.00, which is no longer a positive amount
        assert!(matches!(Amount::new(dec!(0.004)), Err(MoneyError::NotPositive(_))));
    }

    #[test]
    fn test_amount_overflow() {
        assert!(matches!(Amount::new(dec!(1000000000001)), Err(MoneyError::Overflow)));
    }

    #[test]
    fn test_amount_max_value_ok() {
        assert!(Amount::new(dec!(1000000000000)).is_ok());
        assert_eq!(MAX_AMOUNT, dec!(1000000000000));
    }

    #[test]
    fn test_amount_from_str() {
        let amount: Amount = "123.45".parse().unwrap();
        assert_eq!(amount.value(), dec!(123.45));
    }

    #[test]
    fn test_amount_from_str_garbage_rejected() {
        assert!(matches!("not-a-number".parse::<Amount>(), Err(MoneyError::Parse(_))));
    }

    #[test]
    fn test_balance_credit_debit() {
        let balance = Balance::zero();
        let amount = Amount::new(dec!(100)).unwrap();

        let balance = balance.credit(&amount).unwrap();
        assert_eq!(balance.value(), dec!(100));

        let withdraw = Amount::new(dec!(30)).unwrap();
        let balance = balance.debit(&withdraw).unwrap();
        assert_eq!(balance.value(), dec!(70));
    }

    #[test]
    fn test_balance_insufficient() {
        let balance = Balance::new(dec!(50)).unwrap();
        let amount = Amount::new(dec!(100)).unwrap();

        assert!(!balance.is_sufficient_for(&amount));
        assert!(matches!(balance.debit(&amount), Err(MoneyError::Negative(_))));
    }

    #[test]
    fn test_balance_checked_adjust_floor() {
        let balance = Balance::new(dec!(50)).unwrap();
        assert_eq!(balance.checked_adjust(dec!(-50)).unwrap().value(), dec!(0));
        assert!(matches!(
            balance.checked_adjust(dec!(-50.01)),
            Err(MoneyError::Negative(_))
        ));
    }

    #[test]
    fn test_balance_checked_adjust_overflow_capped() {
        let balance = Balance::new(dec!(999999999999)).unwrap();
        assert!(matches!(
            balance.checked_adjust(dec!(2)),
            Err(MoneyError::Overflow)
        ));
        // Right at the cap is still fine
        assert!(balance.checked_adjust(dec!(1)).is_ok());
    }

    #[test]
    fn test_balance_no_drift() {
        // 100.55 - 25.33 and 50.25 + 25.33 stay exact at two digits
        let sender = Balance::new(dec!(100.55)).unwrap();
        let recipient = Balance::new(dec!(50.25)).unwrap();
        let amount = Amount::new(dec!(25.33)).unwrap();

        assert_eq!(sender.debit(&amount).unwrap().value(), dec!(75.22));
        assert_eq!(recipient.credit(&amount).unwrap().value(), dec!(75.58));
    }
}
