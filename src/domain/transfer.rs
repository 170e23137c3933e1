//! Transfer records
//!
//! A `TransferRecord` is written exactly once per transfer that reaches the
//! commit point and is immutable afterwards. Attempts that abort before
//! commit produce no record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Amount;

/// Maximum length of a transfer description
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// Outcome recorded on a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Success,
    Failed,
}

/// One atomic movement of funds between two accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Unique record ID
    pub id: Uuid,

    /// Debited account
    pub sender_id: Uuid,

    /// Credited account
    pub recipient_id: Uuid,

    /// Transferred amount, always positive
    pub amount: Amount,

    pub status: TransferStatus,

    /// Optional free text, at most [`MAX_DESCRIPTION_LEN`] characters
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl TransferRecord {
    /// Build a success record for a transfer about to be committed.
    ///
    /// The description bound is an invariant of the record itself, not of
    /// any one caller: anything past [`MAX_DESCRIPTION_LEN`] characters is
    /// truncated here. The HTTP boundary rejects overlong input outright
    /// before it gets this far.
    pub fn success(
        sender_id: Uuid,
        recipient_id: Uuid,
        amount: Amount,
        description: Option<String>,
    ) -> Self {
        let description = description.map(|d| {
            if d.chars().count() > MAX_DESCRIPTION_LEN {
                d.chars().take(MAX_DESCRIPTION_LEN).collect()
            } else {
                d
            }
        });

        Self {
            id: Uuid::new_v4(),
            sender_id,
            recipient_id,
            amount,
            status: TransferStatus::Success,
            description,
            created_at: Utc::now(),
        }
    }

    /// Whether `account_id` appears on either side of the transfer.
    pub fn involves(&self, account_id: Uuid) -> bool {
        self.sender_id == account_id || self.recipient_id == account_id
    }
}
