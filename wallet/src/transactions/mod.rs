//! Transaction list handling for the wallet screens

pub mod data_manager;
pub mod displayable;
pub mod list_store;
pub mod source;
pub mod store;

pub use data_manager::TransactionListDataManager;
pub use displayable::{newest_first, DisplayableTransaction, TransactionDirection};
pub use list_store::ListStore;
pub use source::{
    is_extended_public_key, AccountSelection, MemoryTransactionSource, TransactionSnapshot,
    TransactionSource, TransactionSourceError,
};
pub use store::TransactionListStore;
