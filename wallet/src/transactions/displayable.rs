use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Transaction direction relative to the wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionDirection {
    Sent,
    Received,
    /// Moved between the wallet's own accounts
    Transferred,
}

/// A transaction as shown in the list screens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayableTransaction {
    pub hash: String,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    #[serde(default)]
    pub confirmations: u32,
    pub direction: TransactionDirection,
    #[serde(default)]
    pub amount: u64,
    #[serde(default)]
    pub fee: u64,
    /// Published locally but not yet seen by the data source
    #[serde(default)]
    pub pending: bool,
}

impl DisplayableTransaction {
    pub fn new(hash: impl Into<String>, timestamp: i64, confirmations: u32) -> Self {
        Self {
            hash: hash.into(),
            timestamp,
            confirmations,
            direction: TransactionDirection::Received,
            amount: 0,
            fee: 0,
            pending: false,
        }
    }

    pub fn with_direction(mut self, direction: TransactionDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_amount(mut self, amount: u64, fee: u64) -> Self {
        self.amount = amount;
        self.fee = fee;
        self
    }

    /// Mark as a locally published, not yet confirmed transaction
    pub fn pending(mut self) -> Self {
        self.pending = true;
        self
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

/// Newest first. Equal timestamps compare equal so a stable sort keeps
/// insertion order.
pub fn newest_first(a: &DisplayableTransaction, b: &DisplayableTransaction) -> Ordering {
    b.timestamp.cmp(&a.timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first_ordering() {
        let old = DisplayableTransaction::new("a", 100, 1);
        let new = DisplayableTransaction::new("b", 200, 0);

        assert_eq!(newest_first(&new, &old), Ordering::Less);
        assert_eq!(newest_first(&old, &new), Ordering::Greater);
        assert_eq!(
            newest_first(&old, &DisplayableTransaction::new("c", 100, 9)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{"hash":"abc","timestamp":1700000000,"direction":"sent"}"#;
        let tx: DisplayableTransaction = serde_json::from_str(json).unwrap();

        assert_eq!(tx.hash, "abc");
        assert_eq!(tx.confirmations, 0);
        assert_eq!(tx.direction, TransactionDirection::Sent);
        assert!(!tx.pending);
        assert_eq!(tx.datetime().unwrap().timestamp(), 1_700_000_000);
    }
}
