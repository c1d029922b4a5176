//! Navigation and dialog seams implemented by each front-end

use crate::funds::TransferableFunds;

/// Screens reachable from the backup flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// First step of the backup flow
    BackupStart,
}

pub trait Navigator: Send + Sync {
    /// Pop every entry off the back stack, including the current one
    fn pop_back_stack_inclusive(&self);

    /// Show `route` and record it on the back stack
    fn push(&self, route: Route);
}

pub trait DialogPresenter: Send + Sync {
    /// Two-button "Send" / "Cancel" prompt about sweepable funds
    fn show_transfer_funds_prompt(&self, funds: &TransferableFunds);

    fn dismiss_transfer_funds_prompt(&self);

    /// Second-step confirmation that actually performs the transfer
    fn show_transfer_funds_confirmation(&self);
}
