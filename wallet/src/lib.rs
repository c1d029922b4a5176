//! Wallet client layer: typed preferences, the transaction list and the
//! backup-complete screen, with console and terminal front-ends.

pub mod backup;
pub mod cli;
pub mod config;
pub mod funds;
pub mod platform;
pub mod prefs;
pub mod transactions;
pub mod ui;

pub use backup::{BackupCompleteScreen, BackupCompleteView, TransferPrompt};
pub use config::Config;
pub use funds::{TransferFundsSource, TransferableFunds};
pub use platform::{DialogPresenter, Navigator, Route};
pub use prefs::{PreferencesStore, PrefsError};
pub use transactions::{DisplayableTransaction, TransactionListDataManager, TransactionListStore};
