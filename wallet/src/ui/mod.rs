//! Front-ends for the wallet screens

pub mod console;
pub mod tui;

pub use console::{
    run_backup_complete, BackupCompleteOutcome, ChoicePrompt, ConsoleDialogs, ConsoleNavigator,
    DialoguerPrompt,
};
pub use tui::{TuiPlatform, TuiState, WalletTui};
