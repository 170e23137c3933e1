//! Account record
//!
//! A holder of a balance. Accounts are created once and never deleted;
//! the balance is mutated exclusively through the store's conditional-adjust
//! primitive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Balance;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique account ID
    pub id: Uuid,

    /// Display name, free text, non-empty
    pub name: String,

    /// Email, unique across all accounts (compared case-insensitively)
    pub email: String,

    /// Current balance, never negative
    pub balance: Balance,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// Last balance mutation
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a fresh account record with a generated id.
    pub fn new(name: impl Into<String>, email: impl Into<String>, balance: Balance) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            balance,
            created_at: now,
            updated_at: now,
        }
    }
}
