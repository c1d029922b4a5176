//! Backup Complete Screen
//!
//! Shown at the end of the backup flow. Displays when the wallet was last
//! backed up and, when asked to, checks whether any imported addresses hold
//! funds that could be swept into the default account.
//!
//! The funds check runs on the tokio runtime and reports back through a
//! channel that the UI side drains with [`BackupCompleteScreen::pump_events`].
//! Tearing the screen down cancels the check so no result is applied to a
//! destroyed screen.

use super::{last_backup_message, DEFAULT_DATE_FORMAT};
use crate::funds::{TransferFundsSource, TransferableFunds};
use crate::platform::{DialogPresenter, Navigator, Route};
use crate::prefs::PreferencesStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Results delivered from background work to the screen
#[derive(Debug)]
pub enum ScreenEvent {
    TransferableFundsLoaded(TransferableFunds),
}

/// State of the "transfer funds" prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferPrompt {
    Hidden,
    Showing(TransferableFunds),
}

/// What the screen renders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupCompleteView {
    /// "Last backed up on ..."; hidden when `None`
    pub last_backup: Option<String>,
}

pub struct BackupCompleteScreen {
    prefs: PreferencesStore,
    funds: Arc<dyn TransferFundsSource>,
    navigator: Arc<dyn Navigator>,
    dialogs: Arc<dyn DialogPresenter>,
    check_transfer: bool,
    date_format: String,
    token: CancellationToken,
    events_tx: mpsc::UnboundedSender<ScreenEvent>,
    events_rx: mpsc::UnboundedReceiver<ScreenEvent>,
    query: Option<JoinHandle<()>>,
    view: BackupCompleteView,
    prompt: TransferPrompt,
    destroyed: bool,
}

impl BackupCompleteScreen {
    pub fn new(
        prefs: PreferencesStore,
        funds: Arc<dyn TransferFundsSource>,
        navigator: Arc<dyn Navigator>,
        dialogs: Arc<dyn DialogPresenter>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            prefs,
            funds,
            navigator,
            dialogs,
            check_transfer: false,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            token: CancellationToken::new(),
            events_tx,
            events_rx,
            query: None,
            view: BackupCompleteView::default(),
            prompt: TransferPrompt::Hidden,
            destroyed: false,
        }
    }

    /// Look for sweepable funds when the screen is created
    pub fn check_transfer(mut self, check: bool) -> Self {
        self.check_transfer = check;
        self
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Build the view and, if enabled, start the funds check.
    ///
    /// Must be called from within a tokio runtime when `check_transfer` is
    /// set.
    pub fn on_create(&mut self) -> &BackupCompleteView {
        self.view = BackupCompleteView {
            last_backup: last_backup_message(&self.prefs, &self.date_format),
        };

        if self.check_transfer && self.query.is_none() && !self.destroyed {
            self.spawn_transfer_check();
        }

        &self.view
    }

    pub fn view(&self) -> &BackupCompleteView {
        &self.view
    }

    pub fn prompt(&self) -> &TransferPrompt {
        &self.prompt
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Apply every event already delivered, without waiting.
    ///
    /// Returns the number of events applied.
    pub fn pump_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if self.destroyed {
                debug!("Dropping {:?} delivered after teardown", event);
                continue;
            }
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the in-flight funds check to finish, then apply its result
    pub async fn settle(&mut self) -> usize {
        if let Some(handle) = self.query.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("Transfer funds check task failed: {}", e);
                }
            }
        }
        self.pump_events()
    }

    /// "Send" on the transfer prompt: dismiss it and open the confirmation
    /// dialog
    pub fn on_transfer_send(&mut self) -> bool {
        if !self.take_prompt() {
            return false;
        }
        self.dialogs.show_transfer_funds_confirmation();
        true
    }

    /// "Cancel" on the transfer prompt
    pub fn on_transfer_cancel(&mut self) -> bool {
        self.take_prompt()
    }

    /// "Backup again": restart the backup flow from its first step
    pub fn on_backup_again(&self) {
        info!("Restarting backup flow");
        self.navigator.pop_back_stack_inclusive();
        self.navigator.push(Route::BackupStart);
    }

    /// Tear down the screen, cancelling any outstanding work
    pub fn on_destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.token.cancel();
        debug!("Backup complete screen destroyed");
    }

    fn spawn_transfer_check(&mut self) {
        let funds = Arc::clone(&self.funds);
        let events = self.events_tx.clone();
        let token = self.token.clone();

        self.query = Some(tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Transfer funds check cancelled");
                }
                result = funds.transferable_funds_for_default_account() => match result {
                    Ok(found) => {
                        let _ = events.send(ScreenEvent::TransferableFundsLoaded(found));
                    }
                    Err(e) => error!("Failed to check transferable funds: {}", e),
                },
            }
        }));
    }

    fn apply(&mut self, event: ScreenEvent) {
        match event {
            ScreenEvent::TransferableFundsLoaded(found) => {
                if found.is_empty() {
                    debug!("No transferable funds");
                    return;
                }
                if self.prompt != TransferPrompt::Hidden {
                    return;
                }
                info!(
                    count = found.pending.len(),
                    total = found.total_to_send,
                    "Transferable funds found"
                );
                self.dialogs.show_transfer_funds_prompt(&found);
                self.prompt = TransferPrompt::Showing(found);
            }
        }
    }

    fn take_prompt(&mut self) -> bool {
        match std::mem::replace(&mut self.prompt, TransferPrompt::Hidden) {
            TransferPrompt::Showing(_) => {
                self.dialogs.dismiss_transfer_funds_prompt();
                true
            }
            TransferPrompt::Hidden => false,
        }
    }
}

impl Drop for BackupCompleteScreen {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
