use super::displayable::{newest_first, DisplayableTransaction};
use super::list_store::ListStore;
use std::collections::HashMap;

/// Transaction list sorted newest first, plus a map of confirmation counts
/// keyed by transaction hash.
///
/// The confirmation map only grows: clearing the list leaves it intact so
/// confirmation counts stay available after switching accounts.
#[derive(Debug, Clone, Default)]
pub struct TransactionListStore {
    transactions: ListStore<DisplayableTransaction>,
    confirmations: HashMap<String, u32>,
}

impl TransactionListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single transaction and re-sort the list
    pub fn insert_and_sort(&mut self, transaction: DisplayableTransaction) {
        self.confirmations
            .insert(transaction.hash.clone(), transaction.confirmations);
        self.transactions.insert(transaction);
        self.transactions.sort_by(newest_first);
    }

    /// Add a batch of transactions, sorting once at the end
    pub fn insert_bulk(&mut self, transactions: Vec<DisplayableTransaction>) {
        for tx in &transactions {
            self.confirmations.insert(tx.hash.clone(), tx.confirmations);
        }
        self.transactions.insert_bulk(transactions);
        self.transactions.sort_by(newest_first);
    }

    /// Confirmation count per transaction hash, from the most recent insert
    /// that included it
    pub fn confirmations_by_hash(&self) -> &HashMap<String, u32> {
        &self.confirmations
    }

    pub fn list(&self) -> &[DisplayableTransaction] {
        self.transactions.list()
    }

    /// Empty the list. Confirmation counts are kept.
    pub fn clear_list(&mut self) {
        self.transactions.clear();
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
