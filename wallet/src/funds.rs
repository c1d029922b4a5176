//! Funds transfer lookup
//!
//! Answers "is there anything sweepable into the default account?" for the
//! backup-complete screen. The real lookup lives in the wallet payload layer;
//! this module only defines the seam and a fixed-answer implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FundsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Funds lookup unavailable: {0}")]
    Unavailable(String),
}

/// One unsigned sweep from an imported address into the default account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransfer {
    /// Label of the address being swept
    pub from_label: String,
    pub from_address: String,
    pub amount: u64,
    pub fee: u64,
}

/// Sweepable funds for the default account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferableFunds {
    #[serde(default)]
    pub pending: Vec<PendingTransfer>,
    #[serde(default)]
    pub total_to_send: u64,
    #[serde(default)]
    pub total_fee: u64,
}

impl TransferableFunds {
    pub fn from_transfers(pending: Vec<PendingTransfer>) -> Self {
        let total_to_send = pending.iter().map(|p| p.amount).sum();
        let total_fee = pending.iter().map(|p| p.fee).sum();
        Self {
            pending,
            total_to_send,
            total_fee,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[async_trait]
pub trait TransferFundsSource: Send + Sync {
    async fn transferable_funds_for_default_account(
        &self,
    ) -> Result<TransferableFunds, FundsError>;
}

/// Always returns the same answer
#[derive(Debug, Clone, Default)]
pub struct StaticFundsSource {
    funds: TransferableFunds,
}

impl StaticFundsSource {
    pub fn new(funds: TransferableFunds) -> Self {
        Self { funds }
    }

    /// Nothing to sweep
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the answer from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FundsError> {
        let data = std::fs::read_to_string(path)?;
        Ok(Self::new(serde_json::from_str(&data)?))
    }
}

#[async_trait]
impl TransferFundsSource for StaticFundsSource {
    async fn transferable_funds_for_default_account(
        &self,
    ) -> Result<TransferableFunds, FundsError> {
        Ok(self.funds.clone())
    }
}
