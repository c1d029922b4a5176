use super::displayable::DisplayableTransaction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransactionSourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Unknown account: {0}")]
    UnknownAccount(String),
    #[error("Unsupported account: {0}")]
    UnsupportedAccount(String),
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Which transactions a list screen is showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountSelection {
    /// Every HD account plus imported addresses
    AllAccountsAndImported,
    /// Imported (non-HD) addresses only
    AllImported,
    Ethereum,
    /// A single account (xpub) or imported address
    Single { address: String },
}

impl std::str::FromStr for AccountSelection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "all" => AccountSelection::AllAccountsAndImported,
            "imported" | "legacy" => AccountSelection::AllImported,
            "eth" | "ethereum" => AccountSelection::Ethereum,
            _ => AccountSelection::Single {
                address: s.to_string(),
            },
        })
    }
}

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Whether `address` looks like a BIP32 extended public key
pub fn is_extended_public_key(address: &str) -> bool {
    (address.starts_with("xpub") || address.starts_with("tpub"))
        && address.len() == 111
        && address.chars().all(|c| BASE58_ALPHABET.contains(c))
}

/// Where transactions and balances come from
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn all_transactions(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DisplayableTransaction>, TransactionSourceError>;

    async fn imported_transactions(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DisplayableTransaction>, TransactionSourceError>;

    async fn account_transactions(
        &self,
        xpub: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DisplayableTransaction>, TransactionSourceError>;

    async fn ethereum_transactions(
        &self,
    ) -> Result<Vec<DisplayableTransaction>, TransactionSourceError>;

    async fn wallet_balance(&self) -> Result<u64, TransactionSourceError>;

    async fn imported_balance(&self) -> Result<u64, TransactionSourceError>;

    async fn address_balance(&self, address: &str) -> Result<u64, TransactionSourceError>;
}

/// Snapshot of a wallet's transactions, loadable from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionSnapshot {
    /// Transactions per HD account, keyed by xpub
    #[serde(default)]
    pub accounts: HashMap<String, Vec<DisplayableTransaction>>,
    #[serde(default)]
    pub imported: Vec<DisplayableTransaction>,
    #[serde(default)]
    pub ethereum: Vec<DisplayableTransaction>,
    /// Balance per xpub or imported address
    #[serde(default)]
    pub balances: HashMap<String, u64>,
    /// Addresses counted as imported when summing balances
    #[serde(default)]
    pub imported_addresses: Vec<String>,
}

/// In-memory [`TransactionSource`] over a [`TransactionSnapshot`]
#[derive(Debug, Clone, Default)]
pub struct MemoryTransactionSource {
    snapshot: TransactionSnapshot,
}

impl MemoryTransactionSource {
    pub fn new(snapshot: TransactionSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TransactionSourceError> {
        let data = std::fs::read_to_string(path)?;
        let snapshot = serde_json::from_str(&data)?;
        Ok(Self::new(snapshot))
    }
}

fn page(
    transactions: impl IntoIterator<Item = DisplayableTransaction>,
    limit: usize,
    offset: usize,
) -> Vec<DisplayableTransaction> {
    transactions.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl TransactionSource for MemoryTransactionSource {
    async fn all_transactions(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DisplayableTransaction>, TransactionSourceError> {
        let mut all: Vec<_> = self
            .snapshot
            .accounts
            .values()
            .flatten()
            .chain(self.snapshot.imported.iter())
            .cloned()
            .collect();
        // HashMap iteration order is arbitrary; page over a stable order
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.hash.cmp(&b.hash)));
        Ok(page(all, limit, offset))
    }

    async fn imported_transactions(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DisplayableTransaction>, TransactionSourceError> {
        Ok(page(self.snapshot.imported.iter().cloned(), limit, offset))
    }

    async fn account_transactions(
        &self,
        xpub: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DisplayableTransaction>, TransactionSourceError> {
        let txs = self
            .snapshot
            .accounts
            .get(xpub)
            .ok_or_else(|| TransactionSourceError::UnknownAccount(xpub.to_string()))?;
        Ok(page(txs.iter().cloned(), limit, offset))
    }

    async fn ethereum_transactions(
        &self,
    ) -> Result<Vec<DisplayableTransaction>, TransactionSourceError> {
        Ok(self.snapshot.ethereum.clone())
    }

    async fn wallet_balance(&self) -> Result<u64, TransactionSourceError> {
        Ok(self.snapshot.balances.values().sum())
    }

    async fn imported_balance(&self) -> Result<u64, TransactionSourceError> {
        Ok(self
            .snapshot
            .imported_addresses
            .iter()
            .filter_map(|a| self.snapshot.balances.get(a))
            .sum())
    }

    async fn address_balance(&self, address: &str) -> Result<u64, TransactionSourceError> {
        Ok(self.snapshot.balances.get(address).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xpub() -> String {
        format!("xpub{}", "6".repeat(107))
    }

    #[test]
    fn test_extended_public_key_detection() {
        assert!(is_extended_public_key(&xpub()));
        assert!(!is_extended_public_key("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2"));
        assert!(!is_extended_public_key(&format!("xpub{}", "0".repeat(107))));
        assert!(!is_extended_public_key("xpub123"));
    }

    #[test]
    fn test_account_selection_parsing() {
        assert_eq!(
            "all".parse::<AccountSelection>().unwrap(),
            AccountSelection::AllAccountsAndImported
        );
        assert_eq!(
            "ETH".parse::<AccountSelection>().unwrap(),
            AccountSelection::Ethereum
        );
        assert_eq!(
            "1abc".parse::<AccountSelection>().unwrap(),
            AccountSelection::Single {
                address: "1abc".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_memory_source_paging_and_balances() {
        let mut snapshot = TransactionSnapshot::default();
        snapshot.accounts.insert(
            xpub(),
            vec![
                DisplayableTransaction::new("a", 300, 1),
                DisplayableTransaction::new("b", 200, 2),
            ],
        );
        snapshot.imported = vec![DisplayableTransaction::new("c", 100, 3)];
        snapshot.balances.insert(xpub(), 5_000);
        snapshot.balances.insert("1imported".to_string(), 700);
        snapshot.imported_addresses = vec!["1imported".to_string()];

        let source = MemoryTransactionSource::new(snapshot);

        let all = source.all_transactions(2, 1).await.unwrap();
        let hashes: Vec<_> = all.iter().map(|t| t.hash.as_str()).collect();
        assert_eq!(hashes, vec!["b", "c"]);

        assert!(matches!(
            source.account_transactions("xpubmissing", 10, 0).await,
            Err(TransactionSourceError::UnknownAccount(_))
        ));

        assert_eq!(source.wallet_balance().await.unwrap(), 5_700);
        assert_eq!(source.imported_balance().await.unwrap(), 700);
        assert_eq!(source.address_balance("nope").await.unwrap(), 0);
    }
}
