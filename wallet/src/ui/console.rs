//! Plain terminal front-end for the backup-complete screen

use crate::backup::{BackupCompleteScreen, TransferPrompt};
use crate::funds::TransferableFunds;
use crate::platform::{DialogPresenter, Navigator, Route};
use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Select};
use tracing::debug;

/// Prints navigation requests instead of switching screens
#[derive(Debug, Default)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn pop_back_stack_inclusive(&self) {
        debug!("Back stack cleared");
    }

    fn push(&self, route: Route) {
        match route {
            Route::BackupStart => {
                println!("Starting a new backup. Run `wallet-ui backup record` once it is written down.")
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct ConsoleDialogs;

impl DialogPresenter for ConsoleDialogs {
    fn show_transfer_funds_prompt(&self, funds: &TransferableFunds) {
        println!();
        println!("Funds found on imported addresses:");
        for line in transfer_summary(funds) {
            println!("  {}", line);
        }
    }

    fn dismiss_transfer_funds_prompt(&self) {
        debug!("Transfer prompt dismissed");
    }

    fn show_transfer_funds_confirmation(&self) {
        println!("Review and confirm the transfer to your default account.");
    }
}

/// What the user chose on the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupCompleteOutcome {
    Done,
    BackupAgain,
}

/// Lines describing each pending sweep and the totals
pub fn transfer_summary(funds: &TransferableFunds) -> Vec<String> {
    let mut lines: Vec<String> = funds
        .pending
        .iter()
        .map(|p| format!("{} ({}): {} sat, fee {} sat", p.from_label, p.from_address, p.amount, p.fee))
        .collect();
    lines.push(format!(
        "Total: {} sat, fees {} sat",
        funds.total_to_send, funds.total_fee
    ));
    lines
}

/// A single-choice question put to the user
pub trait ChoicePrompt {
    /// Index of the chosen item
    fn choose(&self, prompt: &str, items: &[&str]) -> Result<usize>;
}

/// Arrow-key selection on the terminal
#[derive(Debug, Default)]
pub struct DialoguerPrompt;

impl ChoicePrompt for DialoguerPrompt {
    fn choose(&self, prompt: &str, items: &[&str]) -> Result<usize> {
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact()
            .with_context(|| format!("Failed to read choice for \"{}\"", prompt))
    }
}

/// Prompts block on stdin, so they run off the async worker
fn ask(prompts: &dyn ChoicePrompt, prompt: &str, items: &[&str]) -> Result<usize> {
    tokio::task::block_in_place(|| prompts.choose(prompt, items))
}

/// Drive the screen interactively until the user leaves it.
///
/// Requires the multi-threaded tokio runtime.
pub async fn run_backup_complete(
    mut screen: BackupCompleteScreen,
    prompts: &dyn ChoicePrompt,
) -> Result<BackupCompleteOutcome> {
    let view = screen.on_create().clone();
    println!("Your wallet is backed up.");
    if let Some(message) = &view.last_backup {
        println!("{}", message);
    }

    screen.settle().await;

    if matches!(screen.prompt(), TransferPrompt::Showing(_)) {
        let choice = ask(
            prompts,
            "Transfer these funds to your default account?",
            &["Send", "Cancel"],
        )?;
        if choice == 0 {
            screen.on_transfer_send();
        } else {
            screen.on_transfer_cancel();
        }
    }

    let choice = ask(prompts, "What next?", &["Done", "Backup again"])?;

    let outcome = if choice == 1 {
        screen.on_backup_again();
        BackupCompleteOutcome::BackupAgain
    } else {
        BackupCompleteOutcome::Done
    };
    screen.on_destroy();
    Ok(outcome)
}
