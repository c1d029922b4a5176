//! Transaction list data manager
//!
//! Sits between a [`TransactionSource`] and the [`TransactionListStore`]:
//! fetches the selected account's transactions, keeps locally published
//! transactions visible until the source reports them, and serves lookups
//! to the list screens.

use super::displayable::DisplayableTransaction;
use super::source::{
    is_extended_public_key, AccountSelection, TransactionSource, TransactionSourceError,
};
use super::store::TransactionListStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct TransactionListDataManager {
    source: Arc<dyn TransactionSource>,
    store: TransactionListStore,
}

impl TransactionListDataManager {
    pub fn new(source: Arc<dyn TransactionSource>) -> Self {
        Self::with_store(source, TransactionListStore::new())
    }

    pub fn with_store(source: Arc<dyn TransactionSource>, store: TransactionListStore) -> Self {
        Self { source, store }
    }

    /// Refresh the list for `account` and return it sorted newest first.
    ///
    /// On error the current list is left untouched.
    pub async fn fetch_transactions(
        &mut self,
        account: &AccountSelection,
        limit: usize,
        offset: usize,
    ) -> Result<&[DisplayableTransaction], TransactionSourceError> {
        debug!(?account, limit, offset, "Fetching transactions");

        let fetched = match self.fetch_from_source(account, limit, offset).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("Failed to fetch transactions: {}", e);
                return Err(e);
            }
        };

        info!("Fetched {} transactions", fetched.len());
        self.replace_transaction_list(fetched);
        Ok(self.store.list())
    }

    /// Current list, newest first
    pub fn transaction_list(&self) -> &[DisplayableTransaction] {
        self.store.list()
    }

    pub fn clear_transaction_list(&mut self) {
        self.store.clear_list();
    }

    /// Insert a single (usually just-published) transaction
    pub fn insert_transaction_and_return_sorted(
        &mut self,
        transaction: DisplayableTransaction,
    ) -> &[DisplayableTransaction] {
        self.store.insert_and_sort(transaction);
        self.store.list()
    }

    pub fn transaction_from_hash(&self, hash: &str) -> Option<DisplayableTransaction> {
        self.store.list().iter().find(|tx| tx.hash == hash).cloned()
    }

    /// Confirmation counts by hash. Not cleared when switching accounts.
    pub fn confirmations_by_hash(&self) -> &HashMap<String, u32> {
        self.store.confirmations_by_hash()
    }

    /// BTC balance for the selection, in satoshis
    pub async fn btc_balance(
        &self,
        account: &AccountSelection,
    ) -> Result<u64, TransactionSourceError> {
        match account {
            AccountSelection::AllAccountsAndImported => self.source.wallet_balance().await,
            AccountSelection::AllImported => self.source.imported_balance().await,
            AccountSelection::Single { address } => self.source.address_balance(address).await,
            AccountSelection::Ethereum => Err(TransactionSourceError::UnsupportedAccount(
                "cannot get the BTC balance of an ETH account".to_string(),
            )),
        }
    }

    async fn fetch_from_source(
        &self,
        account: &AccountSelection,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DisplayableTransaction>, TransactionSourceError> {
        match account {
            AccountSelection::AllAccountsAndImported => {
                self.source.all_transactions(limit, offset).await
            }
            AccountSelection::AllImported => self.source.imported_transactions(limit, offset).await,
            AccountSelection::Ethereum => self.source.ethereum_transactions().await,
            AccountSelection::Single { address } if is_extended_public_key(address) => {
                self.source
                    .account_transactions(address, limit, offset)
                    .await
            }
            AccountSelection::Single { .. } => {
                self.source.imported_transactions(limit, offset).await
            }
        }
    }

    fn replace_transaction_list(&mut self, mut fetched: Vec<DisplayableTransaction>) {
        let still_pending = self.remaining_pending(&fetched);
        if !still_pending.is_empty() {
            debug!("Keeping {} pending transactions", still_pending.len());
        }

        self.store.clear_list();
        fetched.extend(still_pending);
        self.store.insert_bulk(fetched);
    }

    /// Pending transactions in the current list that the source has not
    /// returned yet
    fn remaining_pending(&self, fetched: &[DisplayableTransaction]) -> Vec<DisplayableTransaction> {
        let fetched_hashes: HashSet<&str> = fetched.iter().map(|tx| tx.hash.as_str()).collect();
        let mut seen = HashSet::new();

        self.store
            .list()
            .iter()
            .filter(|tx| tx.pending && !fetched_hashes.contains(tx.hash.as_str()))
            .filter(|tx| seen.insert(tx.hash.clone()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transactions::source::{MemoryTransactionSource, TransactionSnapshot};

    fn manager_with(imported: Vec<DisplayableTransaction>) -> TransactionListDataManager {
        let snapshot = TransactionSnapshot {
            imported,
            ..Default::default()
        };
        TransactionListDataManager::new(Arc::new(MemoryTransactionSource::new(snapshot)))
    }

    #[tokio::test]
    async fn test_pending_transaction_survives_refresh() {
        let mut manager = manager_with(vec![DisplayableTransaction::new("old", 100, 3)]);

        manager.insert_transaction_and_return_sorted(
            DisplayableTransaction::new("mine", 500, 0).pending(),
        );

        let list = manager
            .fetch_transactions(&AccountSelection::AllImported, 50, 0)
            .await
            .unwrap();
        let hashes: Vec<_> = list.iter().map(|t| t.hash.as_str()).collect();
        assert_eq!(hashes, vec!["mine", "old"]);
    }

    #[tokio::test]
    async fn test_pending_dropped_once_source_reports_it() {
        let mut manager = manager_with(vec![
            DisplayableTransaction::new("old", 100, 3),
            DisplayableTransaction::new("mine", 500, 1),
        ]);
        manager.insert_transaction_and_return_sorted(
            DisplayableTransaction::new("mine", 500, 0).pending(),
        );

        manager
            .fetch_transactions(&AccountSelection::AllImported, 50, 0)
            .await
            .unwrap();

        let list = manager.transaction_list();
        assert_eq!(list.len(), 2);
        let mine = manager.transaction_from_hash("mine").unwrap();
        assert!(!mine.pending);
        assert_eq!(manager.confirmations_by_hash().get("mine"), Some(&1));
    }

    #[tokio::test]
    async fn test_fetch_error_leaves_list_untouched() {
        let mut manager = manager_with(vec![]);
        manager.insert_transaction_and_return_sorted(DisplayableTransaction::new("x", 1, 1));

        let xpub = format!("xpub{}", "6".repeat(107));
        let result = manager
            .fetch_transactions(&AccountSelection::Single { address: xpub }, 10, 0)
            .await;

        assert!(matches!(result, Err(TransactionSourceError::UnknownAccount(_))));
        assert_eq!(manager.transaction_list().len(), 1);
    }

    fn xpub() -> String {
        format!("xpub{}", "6".repeat(107))
    }

    fn routed_manager() -> TransactionListDataManager {
        let mut snapshot = TransactionSnapshot::default();
        snapshot
            .accounts
            .insert(xpub(), vec![DisplayableTransaction::new("hd", 300, 2)]);
        snapshot.imported = vec![DisplayableTransaction::new("imp", 200, 5)];
        snapshot.ethereum = vec![DisplayableTransaction::new("eth", 100, 9)];
        snapshot.balances.insert(xpub(), 7_000);
        snapshot.balances.insert("1legacy".to_string(), 1_250);
        TransactionListDataManager::new(Arc::new(MemoryTransactionSource::new(snapshot)))
    }

    async fn fetched_hashes(
        manager: &mut TransactionListDataManager,
        account: AccountSelection,
    ) -> Vec<String> {
        manager
            .fetch_transactions(&account, 50, 0)
            .await
            .unwrap()
            .iter()
            .map(|t| t.hash.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_each_selection_reads_its_own_bucket() {
        let mut manager = routed_manager();

        assert_eq!(
            fetched_hashes(&mut manager, AccountSelection::Single { address: xpub() }).await,
            vec!["hd"]
        );
        // Anything that is not an xpub is treated as an imported address
        assert_eq!(
            fetched_hashes(
                &mut manager,
                AccountSelection::Single {
                    address: "1legacy".to_string()
                }
            )
            .await,
            vec!["imp"]
        );
        assert_eq!(
            fetched_hashes(&mut manager, AccountSelection::AllImported).await,
            vec!["imp"]
        );
        assert_eq!(
            fetched_hashes(&mut manager, AccountSelection::Ethereum).await,
            vec!["eth"]
        );
        assert_eq!(
            fetched_hashes(&mut manager, AccountSelection::AllAccountsAndImported).await,
            vec!["hd", "imp"]
        );
    }

    #[tokio::test]
    async fn test_single_balance_reads_address_entry() {
        let manager = routed_manager();

        let legacy = AccountSelection::Single {
            address: "1legacy".to_string(),
        };
        assert_eq!(manager.btc_balance(&legacy).await.unwrap(), 1_250);
        let hd = AccountSelection::Single { address: xpub() };
        assert_eq!(manager.btc_balance(&hd).await.unwrap(), 7_000);
        let unknown = AccountSelection::Single {
            address: "1nobody".to_string(),
        };
        assert_eq!(manager.btc_balance(&unknown).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ethereum_balance_is_rejected() {
        let manager = manager_with(vec![]);
        let result = manager.btc_balance(&AccountSelection::Ethereum).await;
        assert!(matches!(
            result,
            Err(TransactionSourceError::UnsupportedAccount(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_keeps_confirmations() {
        let mut manager = manager_with(vec![DisplayableTransaction::new("a", 1, 4)]);
        manager
            .fetch_transactions(&AccountSelection::AllAccountsAndImported, 10, 0)
            .await
            .unwrap();

        manager.clear_transaction_list();
        assert!(manager.transaction_list().is_empty());
        assert_eq!(manager.confirmations_by_hash().get("a"), Some(&4));
        assert!(manager.transaction_from_hash("a").is_none());
    }
}
